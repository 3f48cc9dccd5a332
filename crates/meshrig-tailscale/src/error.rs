//! Tailscale client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailscaleError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TailscaleError {
    pub fn is_transient(&self) -> bool {
        match self {
            TailscaleError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            TailscaleError::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, TailscaleError>;
