//! meshrig provisioning pipeline core
//!
//! This crate provides the reusable core that the meshrig CLI builds its
//! deployment scenarios from: an ordered multi-stage provisioning pipeline
//! with dependency threading through a write-once handle registry and
//! observational progress reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  meshrig CLI                     │
//! │            (rig vpc / mesh / tls)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │              meshrig-pipeline                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  PipelineRunner → Stage → trait Step      │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌────────────────────┐      │
//! │  │HandleRegistry│  │ ProgressReporter   │      │
//! │  └──────────────┘  └────────────────────┘      │
//! └───────┬───────────────┬───────────┬─────────────┘
//!         │               │           │
//! ┌───────▼─────┐ ┌───────▼─────┐ ┌──▼──────────┐
//! │ meshrig-ibm │ │ meshrig-    │ │ meshrig-    │
//! │             │ │ tailscale   │ │ certbot     │
//! └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! A pipeline run is strictly sequential: stages in declared order, steps
//! within a stage in declared order, first failure aborts the whole run.
//! Nothing is rolled back on abort; the final report lists every handle
//! that was registered so the operator can clean up.

pub mod error;
pub mod handle;
pub mod reporter;
pub mod runner;
pub mod stage;
pub mod step;

// Re-exports
pub use error::{RegistryError, StepError};
pub use handle::{HandleRegistry, ResourceHandle, ResourceKind};
pub use reporter::{NullReporter, ProgressReporter};
pub use runner::{PipelineOutcome, PipelineReport, PipelineRunner, RunState};
pub use stage::Stage;
pub use step::{Step, StepResult};
