//! Stages: ordered groups of steps sharing one provisioning purpose

use crate::error::StepError;
use crate::handle::HandleRegistry;
use crate::reporter::{notify, ProgressReporter};
use crate::step::Step;

/// An ordered group of steps sharing one provisioning purpose, for example
/// "create public gateways and subnets across all zones".
///
/// Steps run strictly in declared order; later steps in the same stage may
/// read handles produced by earlier ones. On the first step failure the
/// stage stops immediately without attempting the remaining steps, since
/// they encode real infrastructure dependencies.
#[derive(Debug)]
pub struct Stage {
    name: String,
    steps: Vec<Box<dyn Step>>,
}

/// Failure of one step inside a stage, carrying how many steps succeeded
/// before it so the runner can keep its progress counters exact.
#[derive(Debug)]
pub struct StageFailure {
    pub step_name: String,
    pub error: StepError,
    pub steps_completed: usize,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step, builder style.
    #[must_use]
    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of progress-advance events this stage will emit on a clean
    /// run. Used only for UI proportion, never for correctness.
    pub fn declared_step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name())
    }

    /// Runs every step in order, registering produced handles after each
    /// success. Returns the number of completed steps (equal to the
    /// declared count on success).
    pub(crate) async fn run(
        &self,
        registry: &mut HandleRegistry,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<usize, StageFailure> {
        let mut completed = 0;
        for step in &self.steps {
            tracing::debug!(stage = %self.name, step = %step.name(), "executing step");
            let handles = step.execute(registry).await.map_err(|error| StageFailure {
                step_name: step.name().to_string(),
                error,
                steps_completed: completed,
            })?;

            // Registration happens here, not inside the step, so a failed
            // step cannot leave a partial binding behind.
            for handle in handles {
                tracing::info!(
                    stage = %self.name,
                    step = %step.name(),
                    logical_name = %handle.logical_name,
                    provider_id = %handle.provider_id,
                    "registered handle"
                );
                registry.put(handle).map_err(|err| StageFailure {
                    step_name: step.name().to_string(),
                    error: err.into(),
                    steps_completed: completed,
                })?;
            }

            completed += 1;
            notify(reporter.on_step_done(&self.name));
        }
        Ok(completed)
    }
}
