//! Terminal progress rendering with indicatif.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use meshrig_pipeline::{PipelineReport, ProgressReporter};

/// Renders an overall bar plus one bar per stage. All rendering errors
/// propagate as `anyhow::Error`; the pipeline runner swallows them, so a
/// wedged terminal never aborts provisioning.
pub struct ConsoleReporter {
    multi: MultiProgress,
    overall: ProgressBar,
    stage_bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(total_steps: u64) -> anyhow::Result<Self> {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_steps));
        overall.set_style(
            ProgressStyle::with_template(
                "{prefix:>10.green.bold} [{bar:40.cyan/blue}] {pos}/{len} steps",
            )?
            .progress_chars("=> "),
        );
        overall.set_prefix("overall");

        Ok(Self {
            multi,
            overall,
            stage_bar: None,
        })
    }

    fn finish_current_stage(&mut self) {
        if let Some(bar) = self.stage_bar.take() {
            bar.finish();
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_stage_start(&mut self, stage: &str, step_count: usize) -> anyhow::Result<()> {
        self.finish_current_stage();
        let bar = self.multi.add(ProgressBar::new(step_count as u64));
        bar.set_style(
            ProgressStyle::with_template("{prefix:>10.dim} [{bar:40}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar.set_prefix("stage");
        bar.set_message(stage.to_string());
        self.stage_bar = Some(bar);
        Ok(())
    }

    fn on_step_done(&mut self, _stage: &str) -> anyhow::Result<()> {
        if let Some(bar) = &self.stage_bar {
            bar.inc(1);
        }
        self.overall.inc(1);
        Ok(())
    }

    fn on_pipeline_done(&mut self, report: &PipelineReport) -> anyhow::Result<()> {
        self.finish_current_stage();
        if report.is_success() {
            self.overall.finish();
        } else {
            self.overall.abandon();
        }
        Ok(())
    }
}
