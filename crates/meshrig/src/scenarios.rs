//! Scenario builders: assemble the stage lists for each subcommand.
//!
//! Zone discovery happens before the pipeline is built, so every stage
//! declares an exact step count up front and the progress bars are
//! proportioned correctly from the first tick.

use meshrig_certbot::CertbotConfig;
use meshrig_ibm::{CodeEngineClient, ResourceManagerClient, SecurityGroupRule, VpcClient};
use meshrig_pipeline::Stage;
use meshrig_tailscale::TailscaleClient;
use std::path::PathBuf;
use std::sync::Arc;

use crate::steps::tailscale::{CreateAuthKey, CreateTailscaleInstance};
use crate::steps::tls::{
    CreateDomainMapping, CreateTlsSecret, FetchAppEndpoint, IssueCertificate,
    RemoveExistingMapping, ResolveProject,
};
use crate::steps::vpc::{
    AddSecurityRule, CreatePublicGateway, CreateSecurityGroup, CreateSubnet, CreateVpc,
    LookupSshKey, LookupUbuntuImage, ResolveResourceGroup,
};

/// Tailscale's CGNAT range; every tailnet device address falls in it.
const TAILNET_CIDR: &str = "100.64.0.0/10";

/// Instance profile for the tailnet router (2 vCPU, 4 GiB).
const ROUTER_PROFILE: &str = "cx2-2x4";

/// Everything the IBM-side stages need: resolved clients, the account,
/// the discovered zones and the run's name prefix.
pub struct IbmContext {
    pub rm: Arc<ResourceManagerClient>,
    pub vpc: Arc<VpcClient>,
    pub account_id: String,
    pub resource_group: String,
    pub prefix: String,
    pub zones: Vec<String>,
}

pub struct MeshContext {
    pub ts: Arc<TailscaleClient>,
    pub tag: String,
    pub ssh_key_name: String,
    /// Zone the router instance lands in.
    pub instance_zone: String,
}

pub struct TlsContext {
    pub ce: Arc<CodeEngineClient>,
    pub project_name: String,
    pub app_name: String,
    pub custom_domain: String,
    pub dns_provider: String,
    pub certbot_email: String,
    pub secret_name: String,
    pub cert_dir: PathBuf,
}

/// Stages for `rig vpc`: resolve the account's resource group, create the
/// VPC, then a gateway and subnet per zone, then the security group with
/// its rule set.
pub fn vpc_stages(cx: &IbmContext) -> Vec<Stage> {
    let mut stages = Vec::new();

    stages.push(Stage::new("prepare account").with_step(ResolveResourceGroup {
        rm: cx.rm.clone(),
        account_id: cx.account_id.clone(),
        group_name: cx.resource_group.clone(),
    }));

    stages.push(
        Stage::new(format!("create vpc in {}", cx.vpc.region())).with_step(CreateVpc {
            vpc: cx.vpc.clone(),
            vpc_name: format!("{}-vpc", cx.prefix),
        }),
    );

    let mut network = Stage::new("public gateways and subnets");
    for zone in &cx.zones {
        network.push(Box::new(CreatePublicGateway::new(
            cx.vpc.clone(),
            zone.as_str(),
            format!("{}-pgw-{zone}", cx.prefix),
        )));
        network.push(Box::new(CreateSubnet::new(
            cx.vpc.clone(),
            zone.as_str(),
            format!("{}-subnet-{zone}", cx.prefix),
        )));
    }
    stages.push(network);

    stages.push(
        Stage::new("security group")
            .with_step(CreateSecurityGroup {
                vpc: cx.vpc.clone(),
                group_name: format!("{}-security-group", cx.prefix),
            })
            .with_step(AddSecurityRule {
                vpc: cx.vpc.clone(),
                rule: SecurityGroupRule::inbound_icmp_echo(),
                label: "allow-icmp-echo".to_string(),
            })
            .with_step(AddSecurityRule {
                vpc: cx.vpc.clone(),
                rule: SecurityGroupRule::inbound_tcp_from(22, TAILNET_CIDR),
                label: "allow-ssh-from-tailnet".to_string(),
            })
            .with_step(AddSecurityRule {
                vpc: cx.vpc.clone(),
                rule: SecurityGroupRule::inbound_tcp(80),
                label: "allow-http".to_string(),
            })
            .with_step(AddSecurityRule {
                vpc: cx.vpc.clone(),
                rule: SecurityGroupRule::inbound_tcp(443),
                label: "allow-https".to_string(),
            })
            .with_step(AddSecurityRule {
                vpc: cx.vpc.clone(),
                rule: SecurityGroupRule::outbound_all(),
                label: "allow-all-outbound".to_string(),
            }),
    );

    stages
}

/// Stages for `rig mesh`: the full VPC scenario plus tailnet enrollment
/// and the router instance.
pub fn mesh_stages(cx: &IbmContext, mesh: &MeshContext) -> Vec<Stage> {
    let mut stages = vpc_stages(cx);

    stages.push(
        Stage::new("tailscale enrollment").with_step(CreateAuthKey {
            ts: mesh.ts.clone(),
            tag: mesh.tag.clone(),
        }),
    );

    stages.push(
        Stage::new("router instance")
            .with_step(LookupSshKey {
                vpc: cx.vpc.clone(),
                key_name: mesh.ssh_key_name.clone(),
            })
            .with_step(LookupUbuntuImage {
                vpc: cx.vpc.clone(),
            })
            .with_step(CreateTailscaleInstance {
                vpc: cx.vpc.clone(),
                instance_name: format!("{}-router", cx.prefix),
                profile: ROUTER_PROFILE.to_string(),
                zone: mesh.instance_zone.clone(),
                tag: mesh.tag.clone(),
            }),
    );

    stages
}

/// Stages for `rig tls`: resolve the project and app, issue the
/// certificate, then replace the app's custom domain mapping.
pub fn tls_stages(cx: &TlsContext) -> Vec<Stage> {
    vec![
        Stage::new("resolve code engine target")
            .with_step(ResolveProject {
                ce: cx.ce.clone(),
                project_name: cx.project_name.clone(),
            })
            .with_step(FetchAppEndpoint {
                ce: cx.ce.clone(),
                app_name: cx.app_name.clone(),
            }),
        Stage::new("issue certificate").with_step(IssueCertificate {
            config: CertbotConfig {
                domain: cx.custom_domain.clone(),
                dns_provider: cx.dns_provider.clone(),
                email: cx.certbot_email.clone(),
                work_dir: cx.cert_dir.clone(),
            },
        }),
        Stage::new("map custom domain")
            .with_step(RemoveExistingMapping {
                ce: cx.ce.clone(),
                app_name: cx.app_name.clone(),
            })
            .with_step(CreateTlsSecret {
                ce: cx.ce.clone(),
                secret_name: cx.secret_name.clone(),
            })
            .with_step(CreateDomainMapping {
                ce: cx.ce.clone(),
                app_name: cx.app_name.clone(),
                domain: cx.custom_domain.clone(),
                secret_name: cx.secret_name.clone(),
            }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshrig_ibm::ClientConfig;
    use std::time::Duration;

    fn ibm_context(zones: &[&str]) -> IbmContext {
        let config = ClientConfig::default();
        IbmContext {
            rm: Arc::new(ResourceManagerClient::new("token", &config).unwrap()),
            vpc: Arc::new(VpcClient::new("token", "us-south", &config).unwrap()),
            account_id: "acct-1".to_string(),
            resource_group: "labs".to_string(),
            prefix: "quietriver".to_string(),
            zones: zones.iter().map(|z| z.to_string()).collect(),
        }
    }

    fn mesh_context(cx: &IbmContext) -> MeshContext {
        MeshContext {
            ts: Arc::new(
                TailscaleClient::new("tskey-api-x", "example.com", Duration::from_secs(30))
                    .unwrap(),
            ),
            tag: "tag:router".to_string(),
            ssh_key_name: "laptop".to_string(),
            instance_zone: cx.zones[0].clone(),
        }
    }

    #[test]
    fn vpc_scenario_scales_with_zone_count() {
        let stages = vpc_stages(&ibm_context(&["us-south-1", "us-south-2", "us-south-3"]));
        assert_eq!(stages.len(), 4);

        let total: usize = stages.iter().map(|s| s.declared_step_count()).sum();
        // resolve + vpc + 3x(gateway + subnet) + group + 5 rules
        assert_eq!(total, 14);

        let network = &stages[2];
        let names: Vec<&str> = network.step_names().collect();
        assert_eq!(names[0], "create-gateway-us-south-1");
        assert_eq!(names[1], "create-subnet-us-south-1");
    }

    #[test]
    fn security_rules_come_after_the_group() {
        let stages = vpc_stages(&ibm_context(&["us-south-1"]));
        let names: Vec<&str> = stages[3].step_names().collect();
        assert_eq!(
            names,
            vec![
                "create-security-group",
                "allow-icmp-echo",
                "allow-ssh-from-tailnet",
                "allow-http",
                "allow-https",
                "allow-all-outbound",
            ]
        );
    }

    #[test]
    fn mesh_scenario_extends_the_vpc_scenario() {
        let cx = ibm_context(&["us-south-1"]);
        let mesh = mesh_context(&cx);
        let stages = mesh_stages(&cx, &mesh);

        assert_eq!(stages.len(), 6);
        assert_eq!(stages[4].name(), "tailscale enrollment");
        let router: Vec<&str> = stages[5].step_names().collect();
        assert_eq!(
            router,
            vec![
                "lookup-ssh-key",
                "lookup-ubuntu-image",
                "create-tailscale-instance",
            ]
        );
    }

    #[test]
    fn tls_scenario_orders_removal_before_the_new_mapping() {
        let cx = TlsContext {
            ce: Arc::new(
                CodeEngineClient::new("token", "us-south", &ClientConfig::default()).unwrap(),
            ),
            project_name: "labs".to_string(),
            app_name: "storefront".to_string(),
            custom_domain: "shop.example.com".to_string(),
            dns_provider: "digitalocean".to_string(),
            certbot_email: "ops@example.com".to_string(),
            secret_name: "tls-secret-20260829120000-storefront".to_string(),
            cert_dir: PathBuf::from("certbot-output"),
        };
        let stages = tls_stages(&cx);

        assert_eq!(stages.len(), 3);
        let mapping: Vec<&str> = stages[2].step_names().collect();
        assert_eq!(
            mapping,
            vec![
                "remove-existing-mapping",
                "create-tls-secret",
                "create-domain-mapping",
            ]
        );
    }
}
