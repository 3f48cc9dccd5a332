//! Steps that enroll a compute instance into the tailnet.

use async_trait::async_trait;
use meshrig_ibm::{InstancePrototype, VpcClient};
use meshrig_pipeline::{HandleRegistry, ResourceHandle, ResourceKind, Step, StepResult};
use meshrig_tailscale::TailscaleClient;
use std::sync::Arc;

use super::{from_ibm, from_tailscale, names};

/// Mint a single-use, ephemeral, preauthorized device auth key.
///
/// The key material is carried as the handle's provider id so the
/// instance step can embed it in user data; display code must mask it.
#[derive(Debug)]
pub struct CreateAuthKey {
    pub ts: Arc<TailscaleClient>,
    pub tag: String,
}

#[async_trait]
impl Step for CreateAuthKey {
    fn name(&self) -> &str {
        "create-tailscale-auth-key"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        let created = self
            .ts
            .create_auth_key(&self.tag, true, true)
            .await
            .map_err(from_tailscale)?;
        Ok(vec![ResourceHandle::new(
            names::TAILSCALE_KEY,
            created.key,
            ResourceKind::TailscaleKey,
        )])
    }
}

/// Create the compute instance that joins the tailnet on first boot.
#[derive(Debug)]
pub struct CreateTailscaleInstance {
    pub vpc: Arc<VpcClient>,
    pub instance_name: String,
    pub profile: String,
    pub zone: String,
    pub tag: String,
}

#[async_trait]
impl Step for CreateTailscaleInstance {
    fn name(&self) -> &str {
        "create-tailscale-instance"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let auth_key = registry.provider_id(names::TAILSCALE_KEY)?;
        let prototype = InstancePrototype {
            name: self.instance_name.clone(),
            profile: self.profile.clone(),
            image_id: registry.provider_id(names::IMAGE)?.to_string(),
            zone: self.zone.clone(),
            vpc_id: registry.provider_id(names::VPC)?.to_string(),
            subnet_id: registry.provider_id(&names::subnet(&self.zone))?.to_string(),
            security_group_id: registry.provider_id(names::SECURITY_GROUP)?.to_string(),
            ssh_key_id: registry.provider_id(names::SSH_KEY)?.to_string(),
            resource_group_id: registry.provider_id(names::RESOURCE_GROUP)?.to_string(),
            user_data: tailscale_user_data(auth_key, &self.tag),
        };

        let instance = self
            .vpc
            .create_instance(&prototype)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::INSTANCE,
            instance.id,
            ResourceKind::Instance,
        )])
    }
}

/// Cloud-init user data that installs tailscale and brings the device up
/// tagged and with Tailscale SSH enabled.
fn tailscale_user_data(auth_key: &str, tag: &str) -> String {
    format!(
        "#!/bin/bash\n\
         set -euo pipefail\n\
         curl -fsSL https://tailscale.com/install.sh | sh\n\
         tailscale up --auth-key {auth_key} --advertise-tags {tag} --ssh\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_data_brings_the_device_up_tagged() {
        let script = tailscale_user_data("tskey-auth-abc", "tag:router");
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("--auth-key tskey-auth-abc"));
        assert!(script.contains("--advertise-tags tag:router"));
        assert!(script.contains("--ssh"));
    }
}
