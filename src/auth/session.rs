//! Session lifecycle consumed by the UI.
//!
//! The session is a single observable value: a status plus the identity of
//! the signed-in user, if any. Transitions always replace the whole value,
//! never patch it, so observers can't see a half-updated session. Consumers
//! subscribe through [`SessionHandle`] and react however their rendering
//! model likes; this module knows nothing about UI.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::auth::store::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No signed-in user.
    Anonymous,
    /// A stored credential exists and is being verified with the server.
    Verifying,
    /// Verified credential, `user` is populated.
    Authenticated,
    /// The last login or register attempt failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<UserIdentity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            user: None,
        }
    }

    fn verifying() -> Self {
        Self {
            status: SessionStatus::Verifying,
            user: None,
        }
    }

    fn authenticated(user: UserIdentity) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
        }
    }

    fn failed() -> Self {
        Self {
            status: SessionStatus::Failed,
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

/// Clone-able handle to the observable session value.
///
/// `subscribe` hands out a watch receiver that sees every transition;
/// `current` is a point-in-time read for callers that just poll.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::anonymous());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub(crate) fn replace(&self, session: Session) {
        self.tx.send_replace(session);
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Login, register, logout and verify-on-startup against the remote
/// authentication service.
pub struct SessionContext {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    session: SessionHandle,
}

impl SessionContext {
    pub fn new(client: ApiClient) -> Self {
        let store = client.store();
        let session = client.session().clone();
        Self {
            client,
            store,
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Verify any stored credential with the server and settle the session.
    ///
    /// No stored credential means Anonymous without a network call. A 401
    /// that survives the refresh pipeline means the credential is confirmed
    /// invalid, so it is cleared. Any other failure (network, 5xx) leaves
    /// the credential in place but reports Anonymous: we couldn't confirm
    /// it, which is not the same as knowing it is bad.
    pub async fn initialize(&self) -> Session {
        if self.store.get().is_none() {
            debug!("No stored credential, starting anonymous");
            self.session.replace(Session::anonymous());
            return self.session.current();
        }

        self.session.replace(Session::verifying());
        match self.client.verify().await {
            Ok(user) => {
                debug!(email = %user.email, "Stored credential verified");
                self.session.replace(Session::authenticated(user));
            }
            Err(ApiError::Unauthorized) | Err(ApiError::Refresh(_)) => {
                debug!("Stored credential rejected, clearing it");
                self.store.clear();
                self.session.replace(Session::anonymous());
            }
            Err(e) => {
                warn!(error = %e, "Could not verify stored credential");
                self.session.replace(Session::anonymous());
            }
        }
        self.session.current()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, ApiError> {
        let email = normalize_email(email);
        match self.client.login(&email, password).await {
            Ok(payload) => {
                self.store.set(&payload.access_token);
                self.session
                    .replace(Session::authenticated(payload.user.clone()));
                Ok(payload.user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.store.clear();
                self.session.replace(Session::failed());
                Err(e)
            }
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, ApiError> {
        let email = normalize_email(email);
        match self.client.register(name, &email, password).await {
            Ok(payload) => {
                self.store.set(&payload.access_token);
                self.session
                    .replace(Session::authenticated(payload.user.clone()));
                Ok(payload.user)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.store.clear();
                self.session.replace(Session::failed());
                Err(e)
            }
        }
    }

    /// Best-effort remote logout; local state is cleared regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "Remote logout failed, clearing local session anyway");
        }
        self.store.clear();
        self.session.replace(Session::anonymous());
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
