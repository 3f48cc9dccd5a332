//! Certificate tool error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertbotError {
    #[error("{0} is not installed or not on PATH")]
    ToolNotFound(String),

    #[error("{tool} failed: {stderr}")]
    CommandFailed { tool: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertbotError {
    /// A missing tool or IO trouble may clear up on a re-run; a tool that
    /// ran and rejected the request will not.
    pub fn is_transient(&self) -> bool {
        match self {
            CertbotError::ToolNotFound(_) | CertbotError::Io(_) => true,
            CertbotError::CommandFailed { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CertbotError>;
