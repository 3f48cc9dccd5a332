//! Pipeline runner
//!
//! Executes stages strictly in order, maintains the progress counters and
//! aborts the whole pipeline on the first unrecoverable step failure. No
//! automatic rollback is performed: tearing down partially created cloud
//! infrastructure is higher-risk than leaving it for operator review, so
//! the final report carries every handle created up to the abort.

use crate::error::StepError;
use crate::handle::{HandleRegistry, ResourceHandle};
use crate::reporter::{notify, ProgressReporter};
use crate::stage::Stage;

/// Lifecycle of one pipeline run. There is no transition back from a
/// terminal state; a new run requires a fresh runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

/// Terminal outcome of a pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed,
    Aborted {
        stage: String,
        step: String,
        error: StepError,
    },
}

/// Final report handed to the operator.
#[derive(Debug)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    pub completed_steps: usize,
    pub total_steps: usize,
    /// Every handle registered during the run, in creation order. On abort
    /// these are the resources that exist and need manual cleanup.
    pub handles: Vec<ResourceHandle>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Completed)
    }
}

/// Process-scoped state for one pipeline invocation.
#[derive(Debug)]
struct PipelineState {
    registry: HandleRegistry,
    completed_steps: usize,
    total_steps: usize,
    run_state: RunState,
}

/// Sequential executor for a list of stages.
///
/// The runner exclusively owns the registry and counters for the duration
/// of one run; `run` consumes the runner so terminal state can never be
/// re-entered.
#[derive(Debug)]
pub struct PipelineRunner {
    stages: Vec<Stage>,
    state: PipelineState,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Stage>) -> Self {
        let total_steps = stages.iter().map(Stage::declared_step_count).sum();
        Self {
            stages,
            state: PipelineState {
                registry: HandleRegistry::new(),
                completed_steps: 0,
                total_steps,
                run_state: RunState::NotStarted,
            },
        }
    }

    pub fn total_steps(&self) -> usize {
        self.state.total_steps
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage in order and returns the terminal report.
    pub async fn run(mut self, reporter: &mut dyn ProgressReporter) -> PipelineReport {
        self.state.run_state = RunState::Running;
        let mut abort: Option<PipelineOutcome> = None;

        for stage in &self.stages {
            tracing::info!(stage = %stage.name(), steps = stage.declared_step_count(), "starting stage");
            notify(reporter.on_stage_start(stage.name(), stage.declared_step_count()));

            match stage.run(&mut self.state.registry, reporter).await {
                Ok(completed) => {
                    self.state.completed_steps += completed;
                }
                Err(failure) => {
                    self.state.completed_steps += failure.steps_completed;
                    tracing::error!(
                        stage = %stage.name(),
                        step = %failure.step_name,
                        error = %failure.error,
                        "pipeline aborted"
                    );
                    abort = Some(PipelineOutcome::Aborted {
                        stage: stage.name().to_string(),
                        step: failure.step_name,
                        error: failure.error,
                    });
                    break;
                }
            }
        }

        let outcome = match abort {
            Some(outcome) => {
                self.state.run_state = RunState::Aborted;
                outcome
            }
            None => {
                self.state.run_state = RunState::Completed;
                PipelineOutcome::Completed
            }
        };

        let report = self.into_report(outcome);
        notify(reporter.on_pipeline_done(&report));
        report
    }

    fn into_report(self, outcome: PipelineOutcome) -> PipelineReport {
        debug_assert!(matches!(
            self.state.run_state,
            RunState::Completed | RunState::Aborted
        ));
        PipelineReport {
            outcome,
            completed_steps: self.state.completed_steps,
            total_steps: self.state.total_steps,
            handles: self.state.registry.handles().cloned().collect(),
        }
    }
}
