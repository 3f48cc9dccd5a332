//! meshrig: staged provisioning for IBM Cloud VPC, Tailscale enrollment
//! and Code Engine TLS domain mapping.

mod commands;
mod config;
mod naming;
mod progress;
mod report;
mod scenarios;
mod steps;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::RigConfig;

#[derive(Parser)]
#[command(name = "rig")]
#[command(version, about = "Staged provisioning for IBM Cloud VPC, Tailscale and Code Engine TLS")]
struct Cli {
    /// Per-request timeout for cloud API calls, in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a VPC with per-zone gateways, subnets and a security group
    Vpc {
        /// IBM Cloud region, e.g. us-south
        #[arg(long, env = "RIG_REGION")]
        region: String,

        /// Resource group name to create everything under
        #[arg(long, env = "RESOURCE_GROUP")]
        resource_group: String,

        /// Name prefix for created resources; random when omitted
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Provision a VPC plus a Tailscale-enrolled router instance
    Mesh {
        /// IBM Cloud region, e.g. us-south
        #[arg(long, env = "RIG_REGION")]
        region: String,

        /// Resource group name to create everything under
        #[arg(long, env = "RESOURCE_GROUP")]
        resource_group: String,

        /// Name prefix for created resources; random when omitted
        #[arg(long)]
        prefix: Option<String>,

        /// Tailscale ACL tag for the new device, e.g. tag:router
        #[arg(long)]
        tailscale_tag: String,

        /// Name of an existing VPC SSH key for instance access
        #[arg(long)]
        ssh_key: String,
    },

    /// Issue a TLS certificate and map a custom domain to a Code Engine app
    Tls {
        /// IBM Cloud region of the Code Engine project
        #[arg(long, env = "RIG_REGION")]
        region: String,

        /// Code Engine project name
        #[arg(long)]
        project_name: String,

        /// Code Engine application name
        #[arg(long)]
        app_name: String,

        /// Custom domain to map to the application
        #[arg(long)]
        custom_domain: String,

        /// dns-multi provider plugin name, e.g. digitalocean
        #[arg(long)]
        dns_provider: String,

        /// Contact email for the ACME account
        #[arg(long)]
        certbot_email: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("meshrig {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Credentials come from the environment exactly once, up front.
    let mut config = match RigConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red().bold());
            std::process::exit(1);
        }
    };
    config.timeout_secs = cli.timeout_secs;

    match cli.command {
        Commands::Vpc {
            region,
            resource_group,
            prefix,
        } => commands::vpc::handle(&config, &region, &resource_group, prefix).await,
        Commands::Mesh {
            region,
            resource_group,
            prefix,
            tailscale_tag,
            ssh_key,
        } => {
            commands::mesh::handle(
                &config,
                &region,
                &resource_group,
                prefix,
                &tailscale_tag,
                &ssh_key,
            )
            .await
        }
        Commands::Tls {
            region,
            project_name,
            app_name,
            custom_domain,
            dns_provider,
            certbot_email,
        } => {
            commands::tls::handle(
                &config,
                &region,
                &project_name,
                &app_name,
                &custom_domain,
                &dns_provider,
                &certbot_email,
            )
            .await
        }
        Commands::Version => unreachable!(),
    }
}
