//! IBM Cloud client error types

use thiserror::Error;

/// IBM Cloud API errors
#[derive(Error, Debug)]
pub enum IbmError {
    #[error("IAM authentication failed: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IbmError {
    /// Whether the operator could plausibly succeed by re-running: network
    /// trouble, timeouts, auth-transport failures, throttling and server
    /// errors. Semantic rejections (4xx) are not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            IbmError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            IbmError::Api { status, .. } => *status == 429 || *status >= 500,
            IbmError::Auth(_) => true,
            IbmError::NotFound(_) | IbmError::Json(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, IbmError>;
