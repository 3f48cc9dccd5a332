//! Code Engine v2 API client
//!
//! Project/app lookup, TLS secret creation and custom domain mappings.

use crate::error::{IbmError, Result};
use crate::{check_response, ClientConfig};
use serde::Deserialize;

pub struct CodeEngineClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for CodeEngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEngineClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
    #[serde(default)]
    next: Option<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    start: String,
}

#[derive(Debug, Deserialize)]
struct App {
    #[serde(default)]
    endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedSecret {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainMapping {
    pub name: String,
    pub visibility: String,
    pub component: ComponentRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct DomainMappingList {
    domain_mappings: Vec<DomainMapping>,
}

impl CodeEngineClient {
    pub fn new(
        token: impl Into<String>,
        region: &str,
        config: &ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            token: token.into(),
            base_url: format!("https://api.{region}.codeengine.cloud.ibm.com/v2"),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    /// Resolve a project name to its id, paging through the account's
    /// projects.
    pub async fn project_id_by_name(&self, name: &str) -> Result<String> {
        let mut start: Option<String> = None;
        loop {
            let path = match &start {
                Some(s) => format!("projects?limit=100&start={s}"),
                None => "projects?limit=100".to_string(),
            };
            let page: ProjectList = self.get_json(&path).await?;

            if let Some(project) = page.projects.into_iter().find(|p| p.name == name) {
                return Ok(project.id);
            }
            match page.next {
                Some(link) => start = Some(link.start),
                None => return Err(IbmError::NotFound(format!("project '{name}'"))),
            }
        }
    }

    /// The public endpoint hostname of an application.
    pub async fn app_endpoint(&self, project_id: &str, app_name: &str) -> Result<String> {
        let app: App = self
            .get_json(&format!("projects/{project_id}/apps/{app_name}"))
            .await?;
        app.endpoint
            .ok_or_else(|| IbmError::NotFound(format!("endpoint for app '{app_name}'")))
    }

    /// Create a TLS-format secret holding a certificate chain and key.
    pub async fn create_tls_secret(
        &self,
        project_id: &str,
        name: &str,
        cert: &str,
        key: &str,
    ) -> Result<String> {
        let body = serde_json::json!({
            "name": name,
            "format": "tls",
            "data": {
                "tls.crt": cert,
                "tls.key": key,
            },
        });

        let response = self
            .client
            .post(format!("{}/projects/{project_id}/secrets", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let secret: CreatedSecret = check_response(response).await?.json().await?;
        Ok(secret.id)
    }

    pub async fn list_domain_mappings(&self, project_id: &str) -> Result<Vec<DomainMapping>> {
        let list: DomainMappingList = self
            .get_json(&format!("projects/{project_id}/domain_mappings"))
            .await?;
        Ok(list.domain_mappings)
    }

    /// Name of the existing custom domain mapping for an app, if any.
    pub async fn custom_mapping_for_app(
        &self,
        project_id: &str,
        app_name: &str,
    ) -> Result<Option<String>> {
        let mappings = self.list_domain_mappings(project_id).await?;
        Ok(mappings
            .into_iter()
            .find(|m| m.visibility == "custom" && m.component.name == app_name)
            .map(|m| m.name))
    }

    pub async fn delete_domain_mapping(&self, project_id: &str, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/projects/{project_id}/domain_mappings/{name}",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// Map a custom domain to an application, served with the named TLS
    /// secret.
    pub async fn create_domain_mapping(
        &self,
        project_id: &str,
        app_name: &str,
        domain: &str,
        tls_secret: &str,
    ) -> Result<DomainMapping> {
        let body = serde_json::json!({
            "name": domain,
            "tls_secret": tls_secret,
            "component": {
                "name": app_name,
                "resource_type": "app_v2",
            },
        });

        let response = self
            .client
            .post(format!(
                "{}/projects/{project_id}/domain_mappings",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        Ok(check_response(response).await?.json().await?)
    }
}
