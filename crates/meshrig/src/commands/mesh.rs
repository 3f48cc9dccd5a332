//! `rig mesh`: the vpc scenario plus a tailnet-enrolled router instance.

use meshrig_tailscale::TailscaleClient;
use std::sync::Arc;
use std::time::Duration;

use crate::commands;
use crate::config::RigConfig;
use crate::scenarios::{self, MeshContext};

pub async fn handle(
    config: &RigConfig,
    region: &str,
    resource_group: &str,
    prefix: Option<String>,
    tailscale_tag: &str,
    ssh_key: &str,
) -> anyhow::Result<()> {
    // Validated before any network call so a missing variable fails fast.
    let tailscale = config.require_tailscale()?;

    let (cx, _) = commands::vpc::prepare(config, region, resource_group, prefix).await?;

    let ts = Arc::new(TailscaleClient::new(
        tailscale.api_key,
        tailscale.tailnet,
        Duration::from_secs(config.timeout_secs),
    )?);

    let mesh = MeshContext {
        ts,
        tag: tailscale_tag.to_string(),
        ssh_key_name: ssh_key.to_string(),
        instance_zone: cx.zones[0].clone(),
    };

    commands::run_pipeline(scenarios::mesh_stages(&cx, &mesh)).await
}
