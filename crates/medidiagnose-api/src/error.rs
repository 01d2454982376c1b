//! API errors.

use std::time::Duration;

use thiserror::Error;

/// Where the user is sent after the session is torn down by a 401.
pub const SESSION_EXPIRED_REDIRECT: &str = "/login?session_expired=true";

/// Errors from the HTTP boundary. None of them are retried automatically.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Cannot reach {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error! status: {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Session expired, redirecting to {redirect}")]
    Unauthorized { redirect: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl ApiError {
    /// Whether the user can simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(_) | ApiError::Timeout(_) | ApiError::Status { .. } | ApiError::Decode(_)
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<medidiagnose_core::session::SessionError> for ApiError {
    fn from(e: medidiagnose_core::session::SessionError) -> Self {
        ApiError::Session(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
