//! Steps that issue a certificate and map a custom domain to a Code
//! Engine application.

use async_trait::async_trait;
use meshrig_certbot::CertbotConfig;
use meshrig_ibm::CodeEngineClient;
use meshrig_pipeline::{HandleRegistry, ResourceHandle, ResourceKind, Step, StepError, StepResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{from_certbot, from_ibm, names};

/// Resolve the Code Engine project name to its id.
#[derive(Debug)]
pub struct ResolveProject {
    pub ce: Arc<CodeEngineClient>,
    pub project_name: String,
}

#[async_trait]
impl Step for ResolveProject {
    fn name(&self) -> &str {
        "resolve-project"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        let id = self
            .ce
            .project_id_by_name(&self.project_name)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::PROJECT,
            id,
            ResourceKind::Project,
        )])
    }
}

/// Record the application's public endpoint hostname.
#[derive(Debug)]
pub struct FetchAppEndpoint {
    pub ce: Arc<CodeEngineClient>,
    pub app_name: String,
}

#[async_trait]
impl Step for FetchAppEndpoint {
    fn name(&self) -> &str {
        "fetch-app-endpoint"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let project_id = registry.provider_id(names::PROJECT)?;
        let endpoint = self
            .ce
            .app_endpoint(project_id, &self.app_name)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::APP_ENDPOINT,
            endpoint,
            ResourceKind::Application,
        )])
    }
}

/// Run the certbot DNS challenge for the custom domain.
///
/// The handle's provider id is the work directory the PEM files were
/// written to; the secret step reads them back from there.
#[derive(Debug)]
pub struct IssueCertificate {
    pub config: CertbotConfig,
}

#[async_trait]
impl Step for IssueCertificate {
    fn name(&self) -> &str {
        "issue-certificate"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        meshrig_certbot::issue_certificate(&self.config)
            .await
            .map_err(from_certbot)?;
        Ok(vec![ResourceHandle::new(
            names::CERTIFICATE,
            self.config.work_dir.display().to_string(),
            ResourceKind::Secret,
        )])
    }
}

/// Delete the app's existing custom domain mapping if one exists.
///
/// A removed mapping is recorded under a tombstone name; the original
/// binding, if any run ever made one, is never overwritten.
#[derive(Debug)]
pub struct RemoveExistingMapping {
    pub ce: Arc<CodeEngineClient>,
    pub app_name: String,
}

#[async_trait]
impl Step for RemoveExistingMapping {
    fn name(&self) -> &str {
        "remove-existing-mapping"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let project_id = registry.provider_id(names::PROJECT)?;
        let existing = self
            .ce
            .custom_mapping_for_app(project_id, &self.app_name)
            .await
            .map_err(from_ibm)?;

        match existing {
            Some(mapping_name) => {
                self.ce
                    .delete_domain_mapping(project_id, &mapping_name)
                    .await
                    .map_err(from_ibm)?;
                tracing::info!(mapping = %mapping_name, "removed existing custom mapping");
                Ok(vec![ResourceHandle::new(
                    names::REMOVED_MAPPING,
                    mapping_name,
                    ResourceKind::DomainMapping,
                )])
            }
            None => Ok(vec![]),
        }
    }
}

/// Upload the issued chain and key as a TLS-format project secret.
#[derive(Debug)]
pub struct CreateTlsSecret {
    pub ce: Arc<CodeEngineClient>,
    pub secret_name: String,
}

#[async_trait]
impl Step for CreateTlsSecret {
    fn name(&self) -> &str {
        "create-tls-secret"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let project_id = registry.provider_id(names::PROJECT)?;
        let work_dir = PathBuf::from(registry.provider_id(names::CERTIFICATE)?);
        let certificate = load_issued(&work_dir).await?;

        let id = self
            .ce
            .create_tls_secret(project_id, &self.secret_name, &certificate.chain, &certificate.key)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::TLS_SECRET,
            id,
            ResourceKind::Secret,
        )])
    }
}

async fn load_issued(work_dir: &Path) -> Result<meshrig_certbot::Certificate, StepError> {
    meshrig_certbot::load_certificate(work_dir)
        .await
        .map_err(from_certbot)
}

/// Map the custom domain to the application via the uploaded secret.
#[derive(Debug)]
pub struct CreateDomainMapping {
    pub ce: Arc<CodeEngineClient>,
    pub app_name: String,
    pub domain: String,
    pub secret_name: String,
}

#[async_trait]
impl Step for CreateDomainMapping {
    fn name(&self) -> &str {
        "create-domain-mapping"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let project_id = registry.provider_id(names::PROJECT)?;
        let mapping = self
            .ce
            .create_domain_mapping(project_id, &self.app_name, &self.domain, &self.secret_name)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::DOMAIN_MAPPING,
            mapping.name,
            ResourceKind::DomainMapping,
        )])
    }
}
