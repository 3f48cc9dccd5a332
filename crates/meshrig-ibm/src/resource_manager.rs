//! Resource Manager: resource group lookup

use crate::error::{IbmError, Result};
use crate::{check_response, ClientConfig};
use serde::Deserialize;

const RESOURCE_GROUPS_URL: &str = "https://resource-controller.cloud.ibm.com/v2/resource_groups";

pub struct ResourceManagerClient {
    client: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for ResourceManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManagerClient").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ResourceGroupList {
    resources: Vec<ResourceGroup>,
}

impl ResourceManagerClient {
    pub fn new(token: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            token: token.into(),
        })
    }

    /// All resource groups visible in the account.
    pub async fn list_resource_groups(&self, account_id: &str) -> Result<Vec<ResourceGroup>> {
        let response = self
            .client
            .get(RESOURCE_GROUPS_URL)
            .query(&[("account_id", account_id)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let list: ResourceGroupList = check_response(response).await?.json().await?;
        Ok(list.resources)
    }

    /// Resolve a resource group name to its id.
    pub async fn group_id_by_name(&self, account_id: &str, name: &str) -> Result<String> {
        let groups = self.list_resource_groups(account_id).await?;
        groups
            .into_iter()
            .find(|g| g.name == name)
            .map(|g| g.id)
            .ok_or_else(|| IbmError::NotFound(format!("resource group '{name}'")))
    }
}
