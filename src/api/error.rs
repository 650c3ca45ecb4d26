use thiserror::Error;

/// Terminal failure of a token refresh attempt.
///
/// Kept as its own Clone-able type because a single refresh failure has to
/// be delivered to every caller queued behind the refresh, not just the one
/// that triggered it.
#[derive(Debug, Clone, Error)]
#[error("token refresh failed: {0}")]
pub struct RefreshFailed(pub String);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error(transparent)]
    Refresh(#[from] RefreshFailed),

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        // Walk back to a char boundary: servers send multi-byte UTF-8 too.
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    /// Pull the server-provided `message` field out of a JSON error body,
    /// falling back to the (truncated) raw body.
    fn server_message(body: &str) -> String {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            400..=499 => ApiError::Validation {
                status: status.as_u16(),
                message: Self::server_message(body),
            },
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// True for the 401 signal that may be recovered by a token refresh.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
