//! Steps that build the VPC network: resource group resolution, the VPC
//! itself, per-zone gateways and subnets, and the security group.

use async_trait::async_trait;
use meshrig_ibm::{ResourceManagerClient, SecurityGroupRule, VpcClient};
use meshrig_pipeline::{HandleRegistry, ResourceHandle, ResourceKind, Step, StepResult};
use std::sync::Arc;

use super::{from_ibm, names};

/// Resolve the target resource group name to its id.
#[derive(Debug)]
pub struct ResolveResourceGroup {
    pub rm: Arc<ResourceManagerClient>,
    pub account_id: String,
    pub group_name: String,
}

#[async_trait]
impl Step for ResolveResourceGroup {
    fn name(&self) -> &str {
        "resolve-resource-group"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        let id = self
            .rm
            .group_id_by_name(&self.account_id, &self.group_name)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::RESOURCE_GROUP,
            id,
            ResourceKind::ResourceGroup,
        )])
    }
}

#[derive(Debug)]
pub struct CreateVpc {
    pub vpc: Arc<VpcClient>,
    pub vpc_name: String,
}

#[async_trait]
impl Step for CreateVpc {
    fn name(&self) -> &str {
        "create-vpc"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let group_id = registry.provider_id(names::RESOURCE_GROUP)?;
        let vpc = self
            .vpc
            .create_vpc(&self.vpc_name, group_id)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::VPC,
            vpc.id,
            ResourceKind::Vpc,
        )])
    }
}

#[derive(Debug)]
pub struct CreatePublicGateway {
    pub vpc: Arc<VpcClient>,
    pub zone: String,
    pub gateway_name: String,
    step_name: String,
}

impl CreatePublicGateway {
    pub fn new(vpc: Arc<VpcClient>, zone: impl Into<String>, gateway_name: String) -> Self {
        let zone = zone.into();
        Self {
            vpc,
            step_name: format!("create-gateway-{zone}"),
            zone,
            gateway_name,
        }
    }
}

#[async_trait]
impl Step for CreatePublicGateway {
    fn name(&self) -> &str {
        &self.step_name
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let vpc_id = registry.provider_id(names::VPC)?;
        let group_id = registry.provider_id(names::RESOURCE_GROUP)?;
        let gateway = self
            .vpc
            .create_public_gateway(vpc_id, &self.zone, &self.gateway_name, group_id)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::gateway(&self.zone),
            gateway.id,
            ResourceKind::PublicGateway,
        )])
    }
}

/// Create a zone's subnet, attached to that zone's public gateway.
#[derive(Debug)]
pub struct CreateSubnet {
    pub vpc: Arc<VpcClient>,
    pub zone: String,
    pub subnet_name: String,
    step_name: String,
}

impl CreateSubnet {
    pub fn new(vpc: Arc<VpcClient>, zone: impl Into<String>, subnet_name: String) -> Self {
        let zone = zone.into();
        Self {
            vpc,
            step_name: format!("create-subnet-{zone}"),
            zone,
            subnet_name,
        }
    }
}

#[async_trait]
impl Step for CreateSubnet {
    fn name(&self) -> &str {
        &self.step_name
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let vpc_id = registry.provider_id(names::VPC)?;
        let group_id = registry.provider_id(names::RESOURCE_GROUP)?;
        let gateway_id = registry.provider_id(&names::gateway(&self.zone))?;
        let subnet = self
            .vpc
            .create_subnet(&self.subnet_name, vpc_id, &self.zone, group_id, Some(gateway_id))
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::subnet(&self.zone),
            subnet.id,
            ResourceKind::Subnet,
        )])
    }
}

#[derive(Debug)]
pub struct CreateSecurityGroup {
    pub vpc: Arc<VpcClient>,
    pub group_name: String,
}

#[async_trait]
impl Step for CreateSecurityGroup {
    fn name(&self) -> &str {
        "create-security-group"
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let vpc_id = registry.provider_id(names::VPC)?;
        let group_id = registry.provider_id(names::RESOURCE_GROUP)?;
        let group = self
            .vpc
            .create_security_group(&self.group_name, vpc_id, group_id)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::SECURITY_GROUP,
            group.id,
            ResourceKind::SecurityGroup,
        )])
    }
}

/// Add one rule to the security group. Rules are not separately tracked;
/// the step produces no handle.
#[derive(Debug)]
pub struct AddSecurityRule {
    pub vpc: Arc<VpcClient>,
    pub rule: SecurityGroupRule,
    pub label: String,
}

#[async_trait]
impl Step for AddSecurityRule {
    fn name(&self) -> &str {
        &self.label
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        let group_id = registry.provider_id(names::SECURITY_GROUP)?;
        self.vpc
            .create_security_group_rule(group_id, &self.rule)
            .await
            .map_err(from_ibm)?;
        Ok(vec![])
    }
}

/// Resolve an existing SSH key name to its id.
#[derive(Debug)]
pub struct LookupSshKey {
    pub vpc: Arc<VpcClient>,
    pub key_name: String,
}

#[async_trait]
impl Step for LookupSshKey {
    fn name(&self) -> &str {
        "lookup-ssh-key"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        let id = self
            .vpc
            .ssh_key_id_by_name(&self.key_name)
            .await
            .map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::SSH_KEY,
            id,
            ResourceKind::SshKey,
        )])
    }
}

/// Pick the newest available amd64 Ubuntu stock image.
#[derive(Debug)]
pub struct LookupUbuntuImage {
    pub vpc: Arc<VpcClient>,
}

#[async_trait]
impl Step for LookupUbuntuImage {
    fn name(&self) -> &str {
        "lookup-ubuntu-image"
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        let image = self.vpc.latest_ubuntu_image().await.map_err(from_ibm)?;
        Ok(vec![ResourceHandle::new(
            names::IMAGE,
            image.id,
            ResourceKind::Image,
        )])
    }
}
