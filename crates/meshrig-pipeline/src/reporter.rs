//! Progress reporter capability
//!
//! Reporters are passive observers of stage/step completion. A reporting
//! failure is logged and swallowed, never propagated into step or stage
//! control flow.

use crate::runner::PipelineReport;

/// Observer of pipeline progress events.
///
/// Callbacks may fail (a terminal can go away mid-run); the runner logs
/// and discards the error, so a broken reporter can never change the
/// pipeline's result.
pub trait ProgressReporter: Send {
    /// A stage is about to run. `step_count` is the stage's declared step
    /// count, for UI proportion only.
    fn on_stage_start(&mut self, stage: &str, step_count: usize) -> anyhow::Result<()>;

    /// One step of the named stage completed successfully.
    fn on_step_done(&mut self, stage: &str) -> anyhow::Result<()>;

    /// The pipeline reached a terminal state.
    fn on_pipeline_done(&mut self, report: &PipelineReport) -> anyhow::Result<()>;
}

/// Reporter that does nothing. Useful for tests and non-interactive runs.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn on_stage_start(&mut self, _stage: &str, _step_count: usize) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_step_done(&mut self, _stage: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_pipeline_done(&mut self, _report: &PipelineReport) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Discards a reporter callback error after logging it.
pub(crate) fn notify(result: anyhow::Result<()>) {
    if let Err(err) = result {
        tracing::warn!("progress reporter failed (ignored): {err}");
    }
}
