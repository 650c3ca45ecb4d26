//! Ledgerline client core.
//!
//! The crate wraps the Ledgerline budget tracker's remote API behind an
//! authenticated request pipeline: bearer authorization decided per request,
//! transparent single-flight refresh of an expired access token, and a
//! session lifecycle the UI can observe. Rendering and routing live with
//! the embedding application; this crate only issues requests and reports
//! session state.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledgerline::{ApiClient, Config, FileTokenStore, SessionContext, SessionHandle};
//!
//! # async fn wire() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let store = Arc::new(FileTokenStore::new(Config::storage_dir()?));
//! let session = SessionHandle::new();
//! let client = ApiClient::new(&config, store, session)?;
//!
//! let auth = SessionContext::new(client.clone());
//! auth.initialize().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, RefreshFailed};
pub use auth::{
    FileTokenStore, MemoryTokenStore, Navigator, Session, SessionContext, SessionHandle,
    SessionStatus, TokenStore, UserIdentity,
};
pub use config::Config;
