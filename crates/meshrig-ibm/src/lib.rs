//! IBM Cloud API clients for meshrig
//!
//! Thin HTTPS clients over the documented IBM Cloud interfaces, nothing
//! more: IAM token exchange, Resource Manager group lookup, VPC network
//! provisioning and Code Engine application/domain management. Each call
//! is a single request/response; consistency across calls is the
//! provider's responsibility.

pub mod code_engine;
pub mod error;
pub mod iam;
pub mod resource_manager;
pub mod vpc;

// Re-exports
pub use code_engine::{CodeEngineClient, DomainMapping};
pub use error::{IbmError, Result};
pub use iam::IamClient;
pub use resource_manager::{ResourceGroup, ResourceManagerClient};
pub use vpc::{InstancePrototype, SecurityGroupRule, VpcClient};

use std::time::Duration;

/// Per-client HTTP configuration.
///
/// Every request is bounded by `timeout`; a hit surfaces as a transient
/// [`IbmError::Http`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs),
        }
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Turns a non-2xx response into [`IbmError::Api`] with the body text.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(IbmError::Api {
        status: status.as_u16(),
        message,
    })
}
