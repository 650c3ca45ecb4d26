//! HTTP client module for the Ledgerline backend.
//!
//! Requests are authorized per call by `RequestAuthorizer` and recovered
//! from expired-credential rejections by the refresh pipeline in
//! `crate::auth`.

pub mod authorize;
pub mod client;
pub mod error;

pub use authorize::RequestAuthorizer;
pub use client::ApiClient;
pub use error::{ApiError, RefreshFailed};
