//! IAM token exchange and API key introspection

use crate::error::{IbmError, Result};
use crate::{check_response, ClientConfig};
use serde::Deserialize;

const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const IAM_APIKEY_DETAILS_URL: &str = "https://iam.cloud.ibm.com/v1/apikeys/details";

/// IAM client: exchanges the account API key for a bearer token and looks
/// up the account the key belongs to.
pub struct IamClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiKeyDetails {
    account_id: String,
}

impl IamClient {
    pub fn new(api_key: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            api_key: api_key.into(),
        })
    }

    /// Exchange the API key for an IAM bearer token.
    pub async fn fetch_token(&self) -> Result<String> {
        let params = [
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .post(IAM_TOKEN_URL)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IbmError::Auth(format!("token exchange failed ({status}): {body}")));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("obtained IAM token");
        Ok(token.access_token)
    }

    /// The account id the API key belongs to, needed for Resource Manager
    /// queries.
    pub async fn account_id(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(IAM_APIKEY_DETAILS_URL)
            .bearer_auth(token)
            .header("IAM-Apikey", &self.api_key)
            .send()
            .await?;

        let details: ApiKeyDetails = check_response(response).await?.json().await?;
        Ok(details.account_id)
    }
}
