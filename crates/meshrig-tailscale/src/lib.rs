//! Tailscale API client for meshrig
//!
//! Covers the single operation the provisioning scenarios need: minting a
//! preauthorized device auth key scoped to a tailnet and tag.

pub mod error;

pub use error::{Result, TailscaleError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

const TAILSCALE_API_BASE: &str = "https://api.tailscale.com/api/v2";

/// One-day expiry: keys are minted per provisioning run, the device stays
/// enrolled after the key lapses.
const AUTH_KEY_EXPIRY_SECONDS: u64 = 86_400;

pub struct TailscaleClient {
    client: reqwest::Client,
    api_token: String,
    tailnet: String,
}

// Manual impl so the API token never reaches debug output.
impl std::fmt::Debug for TailscaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailscaleClient")
            .field("tailnet", &self.tailnet)
            .finish_non_exhaustive()
    }
}

/// A freshly minted device auth key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAuthKey {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthKeyRequest {
    capabilities: Capabilities,
    expiry_seconds: u64,
    description: String,
}

#[derive(Debug, Serialize)]
struct Capabilities {
    devices: Devices,
}

#[derive(Debug, Serialize)]
struct Devices {
    create: CreateCapability,
}

#[derive(Debug, Serialize)]
struct CreateCapability {
    reusable: bool,
    ephemeral: bool,
    preauthorized: bool,
    tags: Vec<String>,
}

fn auth_key_request(tag: &str, ephemeral: bool, preauthorized: bool) -> AuthKeyRequest {
    AuthKeyRequest {
        capabilities: Capabilities {
            devices: Devices {
                create: CreateCapability {
                    reusable: false,
                    ephemeral,
                    preauthorized,
                    tags: vec![tag.to_string()],
                },
            },
        },
        expiry_seconds: AUTH_KEY_EXPIRY_SECONDS,
        description: "meshrig provisioning".to_string(),
    }
}

impl TailscaleClient {
    pub fn new(
        api_token: impl Into<String>,
        tailnet: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_token: api_token.into(),
            tailnet: tailnet.into(),
        })
    }

    /// Mint a single-use device auth key carrying the given ACL tag.
    pub async fn create_auth_key(
        &self,
        tag: &str,
        ephemeral: bool,
        preauthorized: bool,
    ) -> Result<CreatedAuthKey> {
        let url = format!(
            "{}/tailnet/{}/keys?all=true",
            TAILSCALE_API_BASE, self.tailnet
        );
        let body = auth_key_request(tag, ephemeral, preauthorized);

        tracing::debug!(tailnet = %self.tailnet, tag, "creating tailscale auth key");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TailscaleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_key_request_shape() {
        let body = auth_key_request("tag:router", true, true);
        let value = serde_json::to_value(&body).unwrap();

        let create = &value["capabilities"]["devices"]["create"];
        assert_eq!(create["reusable"], false);
        assert_eq!(create["ephemeral"], true);
        assert_eq!(create["preauthorized"], true);
        assert_eq!(create["tags"], serde_json::json!(["tag:router"]));
        assert_eq!(value["expirySeconds"], 86_400);
    }

    #[test]
    fn created_key_deserializes() {
        let json = serde_json::json!({ "id": "k1234", "key": "tskey-auth-abcdef" });
        let key: CreatedAuthKey = serde_json::from_value(json).unwrap();
        assert_eq!(key.id, "k1234");
        assert!(key.key.starts_with("tskey-"));
    }
}
