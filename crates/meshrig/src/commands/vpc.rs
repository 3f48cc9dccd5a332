//! `rig vpc`: provision a VPC with per-zone networking and a hardened
//! security group.

use colored::Colorize;
use meshrig_ibm::{ClientConfig, ResourceManagerClient, VpcClient};
use std::sync::Arc;

use crate::config::RigConfig;
use crate::scenarios::{self, IbmContext};
use crate::{commands, naming};

pub async fn handle(
    config: &RigConfig,
    region: &str,
    resource_group: &str,
    prefix: Option<String>,
) -> anyhow::Result<()> {
    let (cx, _) = prepare(config, region, resource_group, prefix).await?;
    commands::run_pipeline(scenarios::vpc_stages(&cx)).await
}

/// Shared setup for the vpc and mesh commands: authenticate, discover the
/// region's zones and pick the run prefix. Returns the context plus the
/// bearer token for callers that need further clients.
pub(crate) async fn prepare(
    config: &RigConfig,
    region: &str,
    resource_group: &str,
    prefix: Option<String>,
) -> anyhow::Result<(IbmContext, String)> {
    let client_config = ClientConfig::with_timeout_secs(config.timeout_secs);
    let (iam, token) = commands::authenticate(config, &client_config).await?;
    let account_id = iam.account_id(&token).await?;

    let rm = Arc::new(ResourceManagerClient::new(&token, &client_config)?);
    let vpc = Arc::new(VpcClient::new(&token, region, &client_config)?);

    let zones = vpc.list_region_zones().await?;
    if zones.is_empty() {
        anyhow::bail!("region '{region}' reports no availability zones");
    }

    let prefix = prefix.unwrap_or_else(naming::random_basename);
    println!(
        "{} {} ({} zones in {})",
        "Provisioning with prefix".bold(),
        prefix.cyan(),
        zones.len(),
        region
    );

    let cx = IbmContext {
        rm,
        vpc,
        account_id,
        resource_group: resource_group.to_string(),
        prefix,
        zones,
    };
    Ok((cx, token))
}
