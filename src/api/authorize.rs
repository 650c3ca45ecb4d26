//! Per-request authorization decisions.

use std::sync::Arc;

use crate::auth::store::TokenStore;

/// Routes that obtain or renew the credential. These never carry an
/// `Authorization` header, even when a token is stored, because a stale
/// bearer header on a login or refresh call can shadow the credential the
/// call is meant to produce.
const PUBLIC_ROUTES: [&str; 3] = ["/auth/register", "/auth/login", "/auth/refresh-token"];

pub(crate) fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|route| path.starts_with(route))
}

/// Decides, per outgoing request, whether to attach the bearer credential.
///
/// The decision consults the literal target path of the request being sent,
/// never global session status, and reads the store fresh on every call so
/// a replay after refresh automatically picks up the new token.
pub struct RequestAuthorizer {
    store: Arc<dyn TokenStore>,
}

impl RequestAuthorizer {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn apply(&self, path: &str, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if is_public_route(path) {
            return request;
        }
        match self.store.get() {
            Some(token) => request.bearer_auth(token),
            // No credential: send unauthenticated and let the server reject.
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_route_allow_list() {
        assert!(is_public_route("/auth/login"));
        assert!(is_public_route("/auth/register"));
        assert!(is_public_route("/auth/refresh-token"));

        assert!(!is_public_route("/auth/verify"));
        assert!(!is_public_route("/auth/logout"));
        assert!(!is_public_route("/transactions"));
        assert!(!is_public_route("/budget"));
    }
}
