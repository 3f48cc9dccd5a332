//! End-to-end pipeline behavior, exercised with collaborator-free steps.

use async_trait::async_trait;
use meshrig_pipeline::{
    HandleRegistry, NullReporter, PipelineOutcome, PipelineReport, PipelineRunner,
    ProgressReporter, ResourceHandle, ResourceKind, Stage, Step, StepError, StepResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Step that registers one fixed handle and records that it ran.
#[derive(Debug)]
struct ProduceStep {
    name: &'static str,
    handle: ResourceHandle,
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl Step for ProduceStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.handle.clone()])
    }
}

/// Step that first resolves a dependency, then registers its own handle.
#[derive(Debug)]
struct DependentStep {
    name: &'static str,
    depends_on: &'static str,
    handle: ResourceHandle,
    collaborator_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Step for DependentStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, registry: &HandleRegistry) -> StepResult {
        registry.get(self.depends_on)?;
        // Only counted once the dependency resolved, like a real step that
        // checks its wiring before calling out.
        self.collaborator_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.handle.clone()])
    }
}

#[derive(Debug)]
struct RejectedStep {
    name: &'static str,
}

#[async_trait]
impl Step for RejectedStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _registry: &HandleRegistry) -> StepResult {
        Err(StepError::CollaboratorRejected(
            "name collision".to_string(),
        ))
    }
}

/// Reporter that fails on every callback.
struct BrokenReporter;

impl ProgressReporter for BrokenReporter {
    fn on_stage_start(&mut self, _stage: &str, _step_count: usize) -> anyhow::Result<()> {
        anyhow::bail!("terminal went away")
    }

    fn on_step_done(&mut self, _stage: &str) -> anyhow::Result<()> {
        anyhow::bail!("terminal went away")
    }

    fn on_pipeline_done(&mut self, _report: &PipelineReport) -> anyhow::Result<()> {
        anyhow::bail!("terminal went away")
    }
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn vpc_then_subnet(collaborator_calls: &Arc<AtomicUsize>) -> Vec<Stage> {
    vec![Stage::new("network")
        .with_step(ProduceStep {
            name: "create-vpc",
            handle: ResourceHandle::new("vpc", "v-1", ResourceKind::Vpc),
            executions: counter(),
        })
        .with_step(DependentStep {
            name: "create-subnet",
            depends_on: "vpc",
            handle: ResourceHandle::new("subnet", "s-1", ResourceKind::Subnet),
            collaborator_calls: collaborator_calls.clone(),
        })]
}

#[tokio::test]
async fn scenario_a_two_step_pipeline_completes() {
    let calls = counter();
    let report = PipelineRunner::new(vpc_then_subnet(&calls))
        .run(&mut NullReporter)
        .await;

    assert!(report.is_success());
    assert_eq!(report.completed_steps, 2);
    assert_eq!(report.total_steps, 2);

    let bindings: Vec<(&str, &str)> = report
        .handles
        .iter()
        .map(|h| (h.logical_name.as_str(), h.provider_id.as_str()))
        .collect();
    assert_eq!(bindings, vec![("vpc", "v-1"), ("subnet", "s-1")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_b_second_step_rejection_keeps_first_handle() {
    let stages = vec![Stage::new("network")
        .with_step(ProduceStep {
            name: "create-vpc",
            handle: ResourceHandle::new("vpc", "v-1", ResourceKind::Vpc),
            executions: counter(),
        })
        .with_step(RejectedStep {
            name: "create-subnet",
        })];

    let report = PipelineRunner::new(stages).run(&mut NullReporter).await;

    assert_eq!(report.completed_steps, 1);
    match &report.outcome {
        PipelineOutcome::Aborted { stage, step, error } => {
            assert_eq!(stage, "network");
            assert_eq!(step, "create-subnet");
            assert!(matches!(error, StepError::CollaboratorRejected(_)));
        }
        other => panic!("expected abort, got {other:?}"),
    }

    let bindings: Vec<(&str, &str)> = report
        .handles
        .iter()
        .map(|h| (h.logical_name.as_str(), h.provider_id.as_str()))
        .collect();
    assert_eq!(bindings, vec![("vpc", "v-1")]);
}

#[tokio::test]
async fn scenario_c_missing_dependency_fails_before_collaborator_call() {
    let calls = counter();
    let stages = vec![Stage::new("network").with_step(DependentStep {
        name: "create-subnet",
        depends_on: "gateway",
        handle: ResourceHandle::new("subnet", "s-1", ResourceKind::Subnet),
        collaborator_calls: calls.clone(),
    })];

    let report = PipelineRunner::new(stages).run(&mut NullReporter).await;

    match &report.outcome {
        PipelineOutcome::Aborted { error, .. } => {
            assert_eq!(error, &StepError::MissingDependency("gateway".to_string()));
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(report.completed_steps, 0);
    assert!(report.handles.is_empty());
    // The dependency check aborted before anything was attempted.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn later_stages_do_not_run_after_a_failure() {
    let executions = counter();
    let stages = vec![
        Stage::new("one").with_step(RejectedStep { name: "fails" }),
        Stage::new("two").with_step(ProduceStep {
            name: "never-runs",
            handle: ResourceHandle::new("vpc", "v-1", ResourceKind::Vpc),
            executions: executions.clone(),
        }),
    ];

    let report = PipelineRunner::new(stages).run(&mut NullReporter).await;

    assert!(!report.is_success());
    assert_eq!(executions.load(Ordering::SeqCst), 0);
    match &report.outcome {
        PipelineOutcome::Aborted { stage, .. } => assert_eq!(stage, "one"),
        other => panic!("expected abort, got {other:?}"),
    }
}

#[tokio::test]
async fn broken_reporter_does_not_change_the_result() {
    let calls_a = counter();
    let calls_b = counter();

    let with_null = PipelineRunner::new(vpc_then_subnet(&calls_a))
        .run(&mut NullReporter)
        .await;
    let with_broken = PipelineRunner::new(vpc_then_subnet(&calls_b))
        .run(&mut BrokenReporter)
        .await;

    assert!(with_null.is_success());
    assert!(with_broken.is_success());
    assert_eq!(with_null.completed_steps, with_broken.completed_steps);
    assert_eq!(with_null.handles.len(), with_broken.handles.len());
}
