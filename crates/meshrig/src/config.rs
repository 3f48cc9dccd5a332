//! Credential configuration read from the environment.
//!
//! Credentials are resolved exactly once at startup, before any pipeline
//! stage runs. A missing variable is a startup failure, never a mid-run
//! step failure.

use thiserror::Error;

pub const IBMCLOUD_API_KEY: &str = "IBMCLOUD_API_KEY";
pub const TAILSCALE_API_KEY: &str = "TAILSCALE_API_KEY";
pub const TAILNET_ID: &str = "TAILNET_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not found")]
    MissingEnvVar(&'static str),
}

/// Credentials for the Tailscale control-plane API.
#[derive(Debug, Clone)]
pub struct TailscaleConfig {
    pub api_key: String,
    pub tailnet: String,
}

#[derive(Debug, Clone)]
pub struct RigConfig {
    pub ibmcloud_api_key: String,
    tailscale_api_key: Option<String>,
    tailnet_id: Option<String>,
    /// Per-request timeout for cloud API calls, in seconds.
    pub timeout_secs: u64,
}

impl RigConfig {
    /// Reads credentials from the environment. Only the IBM Cloud key is
    /// mandatory; Tailscale credentials are validated lazily by the
    /// commands that need them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ibmcloud_api_key =
            env_non_empty(IBMCLOUD_API_KEY).ok_or(ConfigError::MissingEnvVar(IBMCLOUD_API_KEY))?;

        Ok(Self {
            ibmcloud_api_key,
            tailscale_api_key: env_non_empty(TAILSCALE_API_KEY),
            tailnet_id: env_non_empty(TAILNET_ID),
            timeout_secs: 30,
        })
    }

    pub fn require_tailscale(&self) -> Result<TailscaleConfig, ConfigError> {
        let api_key = self
            .tailscale_api_key
            .clone()
            .ok_or(ConfigError::MissingEnvVar(TAILSCALE_API_KEY))?;
        let tailnet = self
            .tailnet_id
            .clone()
            .ok_or(ConfigError::MissingEnvVar(TAILNET_ID))?;
        Ok(TailscaleConfig { api_key, tailnet })
    }
}

// An empty value counts as unset, matching how shells export blanks.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
