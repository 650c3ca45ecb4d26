//! API client for the Ledgerline backend.
//!
//! Every request goes through the same path: the [`RequestAuthorizer`]
//! attaches the bearer credential for protected routes, and a protected
//! response of 401 is routed through the [`RefreshCoordinator`] and replayed
//! exactly once with the refreshed token. Validation and server errors pass
//! through untouched; recovery applies only to the expired-credential case.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::authorize::{is_public_route, RequestAuthorizer};
use crate::api::error::ApiError;
use crate::auth::coordinator::{Navigator, RefreshCoordinator};
use crate::auth::session::{SessionHandle, UserIdentity};
use crate::auth::store::TokenStore;
use crate::config::Config;
use crate::models::{
    Budget, DashboardSummary, NewBudget, NewTransaction, Transaction, TransactionQuery,
    TransactionsResponse,
};

/// A successful login or register response. Both fields are mandatory even
/// on an otherwise-200 response.
pub(crate) struct AuthPayload {
    pub access_token: String,
    pub user: UserIdentity,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<UserIdentity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
}

/// Ledgerline API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and clones share the refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    authorizer: Arc<RequestAuthorizer>,
    coordinator: Arc<RefreshCoordinator>,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        config: &Config,
        store: Arc<dyn TokenStore>,
        session: SessionHandle,
    ) -> Result<Self, ApiError> {
        Self::with_navigator(config, store, session, None)
    }

    /// Create a client wired to the hosting UI's navigation, so a terminal
    /// refresh failure can redirect to the login surface.
    pub fn with_navigator(
        config: &Config,
        store: Arc<dyn TokenStore>,
        session: SessionHandle,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            session.clone(),
            navigator,
        ));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorizer: Arc::new(RequestAuthorizer::new(store.clone())),
            store,
            coordinator,
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub(crate) fn store(&self) -> Arc<dyn TokenStore> {
        self.store.clone()
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.authorizer.apply(path, request);
        Ok(request.send().await?)
    }

    /// Send a request, transparently recovering from one expired-credential
    /// rejection. The `retried` flag guarantees a request is replayed at
    /// most once: a second 401 surfaces to the caller instead of looping.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut retried = false;
        loop {
            let response = self.send_once(&method, path, query, body.as_ref()).await?;

            if response.status() == StatusCode::UNAUTHORIZED
                && !retried
                && !is_public_route(path)
            {
                retried = true;
                debug!(path, "Unauthorized response, entering token refresh");
                self.coordinator
                    .recover(|| self.refresh_access_token())
                    .await?;
                // Replay reads the refreshed token from the store.
                continue;
            }

            if response.status().is_success() {
                return Ok(response);
            }
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body_text));
        }
    }

    /// The single refresh call; only ever invoked inside the coordinator's
    /// single flight.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let response = self
            .send_once(&Method::POST, "/auth/refresh-token", &[], None)
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let parsed: RefreshResponse = response.json().await?;
        parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidResponse("No access token received from refresh".into())
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, &[], None).await?;
        response.json().await.map_err(ApiError::from)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable body: {e}")))?;
        self.execute(Method::POST, path, &[], Some(body)).await?;
        Ok(())
    }

    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable body: {e}")))?;
        self.execute(Method::PUT, path, &[], Some(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    // ===== Authentication endpoints =====

    pub(crate) async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.execute(Method::POST, "/auth/login", &[], Some(body)).await?;
        Self::parse_auth_payload(response, "login").await
    }

    pub(crate) async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ApiError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        let response = self
            .execute(Method::POST, "/auth/register", &[], Some(body))
            .await?;
        Self::parse_auth_payload(response, "registration").await
    }

    async fn parse_auth_payload(
        response: reqwest::Response,
        what: &str,
    ) -> Result<AuthPayload, ApiError> {
        let parsed: AuthResponse = response.json().await?;
        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("No access token received from {what}"))
            })?;
        let user = parsed.user.ok_or_else(|| {
            ApiError::InvalidResponse(format!("No user data received from {what}"))
        })?;
        Ok(AuthPayload { access_token, user })
    }

    pub(crate) async fn verify(&self) -> Result<UserIdentity, ApiError> {
        self.get("/auth/verify").await
    }

    pub(crate) async fn logout(&self) -> Result<(), ApiError> {
        self.execute(Method::POST, "/auth/logout", &[], None).await?;
        Ok(())
    }

    // ===== Domain endpoints =====

    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let page = self
            .fetch_transactions_with(&TransactionQuery::default())
            .await?;
        Ok(page.transactions)
    }

    /// Fetch a filtered, paginated page of the transaction list.
    pub async fn fetch_transactions_with(
        &self,
        query: &TransactionQuery,
    ) -> Result<TransactionsResponse, ApiError> {
        let response = self
            .execute(Method::GET, "/transactions", &query.to_pairs(), None)
            .await?;
        response.json().await.map_err(ApiError::from)
    }

    /// Fetch the distinct categories used by the signed-in user's
    /// transactions.
    pub async fn fetch_categories(&self) -> Result<Vec<String>, ApiError> {
        self.get("/transactions/categories").await
    }

    pub async fn create_transaction(&self, transaction: &NewTransaction) -> Result<(), ApiError> {
        self.post("/transactions", transaction).await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        transaction: &NewTransaction,
    ) -> Result<(), ApiError> {
        self.put(&format!("/transactions/{id}"), transaction).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/transactions/{id}")).await
    }

    pub async fn fetch_budgets(&self) -> Result<Vec<Budget>, ApiError> {
        self.get("/budget").await
    }

    pub async fn set_budget(&self, budget: &NewBudget) -> Result<(), ApiError> {
        self.post("/budget", budget).await
    }

    pub async fn fetch_dashboard(&self) -> Result<DashboardSummary, ApiError> {
        self.get("/dashboard").await
    }
}
