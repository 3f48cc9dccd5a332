//! Subcommand handlers.

pub mod mesh;
pub mod tls;
pub mod vpc;

use anyhow::anyhow;
use meshrig_ibm::{ClientConfig, IamClient};
use meshrig_pipeline::{PipelineOutcome, PipelineRunner, Stage};

use crate::config::RigConfig;
use crate::progress::ConsoleReporter;
use crate::report;

/// Exchange the configured API key for a bearer token before any stage
/// runs: an auth failure is a startup error, not a pipeline abort.
pub(crate) async fn authenticate(
    config: &RigConfig,
    client_config: &ClientConfig,
) -> anyhow::Result<(IamClient, String)> {
    let iam = IamClient::new(&config.ibmcloud_api_key, client_config)?;
    let token = iam.fetch_token().await?;
    Ok((iam, token))
}

pub(crate) async fn run_pipeline(stages: Vec<Stage>) -> anyhow::Result<()> {
    let runner = PipelineRunner::new(stages);
    let mut reporter = ConsoleReporter::new(runner.total_steps() as u64)?;

    let report = runner.run(&mut reporter).await;
    report::print_report(&report);

    match &report.outcome {
        PipelineOutcome::Completed => Ok(()),
        PipelineOutcome::Aborted { stage, step, .. } => Err(anyhow!(
            "pipeline aborted in stage '{stage}' at step '{step}'"
        )),
    }
}
