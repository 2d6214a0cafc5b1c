use oa_core::error::CoreError;

/// Longest response body (in characters) kept on an HTTP error.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors from the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status other than 401/403.
    #[error("API error ({status}): {body}")]
    Http {
        status: u16,
        /// Response body, truncated to [`MAX_ERROR_BODY_CHARS`].
        body: String,
    },

    /// The envelope carried a `code` outside the accepted success codes.
    #[error("{message}")]
    Application { code: i64, message: String },

    /// The backend rejected the session (401/403). By the time the caller
    /// sees this the local session has been cleared and the navigator sent
    /// to the login route.
    #[error("Session expired ({status}), please sign in again")]
    Unauthorized { status: u16 },

    /// The body did not match the expected DTO shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// A domain-level error, e.g. a payload that failed validation before
    /// it was sent.
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Unauthorized { status } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text for the failure toast. `None` for auth failures, which are
    /// handled by the redirect instead of a generic error.
    pub fn toast_message(&self) -> Option<String> {
        match self {
            Self::Unauthorized { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

/// Truncate a response body for inclusion in an error, on a char boundary.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
