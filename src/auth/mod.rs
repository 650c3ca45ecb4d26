//! Authentication module: session lifecycle and token management.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the current access token
//! - `RefreshCoordinator`: single-flight recovery from expired credentials
//! - `SessionContext`: verify-on-startup, login, register, and logout over
//!   an observable `Session` value

pub mod coordinator;
pub mod session;
pub mod store;

pub use coordinator::{Navigator, RefreshCoordinator};
pub use session::{Session, SessionContext, SessionHandle, SessionStatus, UserIdentity};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
