//! `rig tls`: issue a certificate for a custom domain and map it to a
//! Code Engine application.

use chrono::Local;
use colored::Colorize;
use meshrig_ibm::{ClientConfig, CodeEngineClient};
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands;
use crate::config::RigConfig;
use crate::scenarios::{self, TlsContext};

#[allow(clippy::too_many_arguments)]
pub async fn handle(
    config: &RigConfig,
    region: &str,
    project_name: &str,
    app_name: &str,
    custom_domain: &str,
    dns_provider: &str,
    certbot_email: &str,
) -> anyhow::Result<()> {
    let client_config = ClientConfig::with_timeout_secs(config.timeout_secs);
    let (_, token) = commands::authenticate(config, &client_config).await?;

    let ce = Arc::new(CodeEngineClient::new(&token, region, &client_config)?);

    // Timestamped so re-running never collides with the previous secret.
    let secret_name = format!(
        "tls-secret-{}-{app_name}",
        Local::now().format("%Y%m%d%H%M%S")
    );

    println!(
        "{} {} {} {}",
        "Mapping".bold(),
        custom_domain.cyan(),
        "to app".bold(),
        app_name.cyan()
    );

    let cx = TlsContext {
        ce,
        project_name: project_name.to_string(),
        app_name: app_name.to_string(),
        custom_domain: custom_domain.to_string(),
        dns_provider: dns_provider.to_string(),
        certbot_email: certbot_email.to_string(),
        secret_name,
        cert_dir: PathBuf::from("certbot-output"),
    };

    commands::run_pipeline(scenarios::tls_stages(&cx)).await
}
