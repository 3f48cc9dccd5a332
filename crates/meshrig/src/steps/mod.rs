//! Provisioning steps
//!
//! Each step wraps exactly one collaborator call. Steps resolve their
//! inputs through the handle registry by logical name and return the
//! handles for whatever they created; the runner owns registration.

pub mod tailscale;
pub mod tls;
pub mod vpc;

use meshrig_certbot::CertbotError;
use meshrig_ibm::IbmError;
use meshrig_pipeline::StepError;
use meshrig_tailscale::TailscaleError;

/// Logical handle names shared between producing and consuming steps.
pub mod names {
    pub const RESOURCE_GROUP: &str = "resource-group";
    pub const VPC: &str = "vpc";
    pub const SECURITY_GROUP: &str = "security-group";
    pub const SSH_KEY: &str = "ssh-key";
    pub const IMAGE: &str = "image";
    pub const INSTANCE: &str = "instance";
    pub const TAILSCALE_KEY: &str = "tailscale-key";
    pub const PROJECT: &str = "project";
    pub const APP_ENDPOINT: &str = "app-endpoint";
    pub const CERTIFICATE: &str = "certificate";
    pub const REMOVED_MAPPING: &str = "removed-mapping";
    pub const TLS_SECRET: &str = "tls-secret";
    pub const DOMAIN_MAPPING: &str = "domain-mapping";

    pub fn gateway(zone: &str) -> String {
        format!("gateway-{zone}")
    }

    pub fn subnet(zone: &str) -> String {
        format!("subnet-{zone}")
    }
}

pub(crate) fn from_ibm(err: IbmError) -> StepError {
    if err.is_transient() {
        StepError::CollaboratorUnavailable(err.to_string())
    } else {
        StepError::CollaboratorRejected(err.to_string())
    }
}

pub(crate) fn from_tailscale(err: TailscaleError) -> StepError {
    if err.is_transient() {
        StepError::CollaboratorUnavailable(err.to_string())
    } else {
        StepError::CollaboratorRejected(err.to_string())
    }
}

pub(crate) fn from_certbot(err: CertbotError) -> StepError {
    if err.is_transient() {
        StepError::CollaboratorUnavailable(err.to_string())
    } else {
        StepError::CollaboratorRejected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_ibm_errors_map_to_unavailable() {
        let err = IbmError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert!(matches!(
            from_ibm(err),
            StepError::CollaboratorUnavailable(_)
        ));
    }

    #[test]
    fn semantic_ibm_errors_map_to_rejected() {
        let err = IbmError::Api {
            status: 409,
            message: "name already exists".to_string(),
        };
        assert!(matches!(from_ibm(err), StepError::CollaboratorRejected(_)));
    }

    #[test]
    fn per_zone_names_embed_the_zone() {
        assert_eq!(names::gateway("us-south-1"), "gateway-us-south-1");
        assert_eq!(names::subnet("us-south-2"), "subnet-us-south-2");
    }
}
