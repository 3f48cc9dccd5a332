//! Step trait
//!
//! A step is the unit of provisioning work: it resolves its dependencies
//! from the registry, invokes exactly one external collaborator operation
//! and returns the handles for whatever it created.

use crate::error::StepError;
use crate::handle::{HandleRegistry, ResourceHandle};
use async_trait::async_trait;
use std::fmt::Debug;

/// Outcome of one step execution.
///
/// A failed step carries no handles by construction, so a failure can never
/// cause a partial registry mutation: the runner only registers handles on
/// `Ok`.
pub type StepResult = Result<Vec<ResourceHandle>, StepError>;

/// A single unit of provisioning work.
///
/// Inputs are fields on the implementing struct: literals supplied by the
/// operator, or logical names resolved through the registry at execute
/// time. A step must check all of its registry dependencies before calling
/// out to a collaborator, so a wiring bug surfaces as
/// [`StepError::MissingDependency`] without touching the cloud account.
///
/// The underlying create-calls are not guaranteed idempotent; retrying an
/// already-failed step is safe only because failure leaves the registry
/// untouched. Re-running after a reported success is an operator concern.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step, used in progress and abort reporting.
    fn name(&self) -> &str;

    /// Executes the step against its external collaborator.
    async fn execute(&self, registry: &HandleRegistry) -> StepResult;
}
