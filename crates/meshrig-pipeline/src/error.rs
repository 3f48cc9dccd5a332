//! Pipeline error types

use thiserror::Error;

/// Handle registry errors
///
/// The registry is write-once: a duplicate `put` and a lookup of an unbound
/// name are the only ways it can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handle '{0}' is already bound")]
    DuplicateHandle(String),

    #[error("no handle bound to '{0}'")]
    UnknownHandle(String),
}

/// Errors surfaced by a provisioning step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Network, timeout or authentication-transport failure reaching the
    /// collaborator. Transient: the operator may re-run the pipeline.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The collaborator returned a semantic rejection (name collision,
    /// quota exceeded, validation error). Never retried automatically.
    #[error("collaborator rejected the request: {0}")]
    CollaboratorRejected(String),

    /// A registry lookup on an unbound name. A pipeline wiring bug, not a
    /// transient condition; always fatal.
    #[error("missing dependency: no handle bound to '{0}'")]
    MissingDependency(String),

    /// A step tried to register a logical name that is already bound.
    /// Also a wiring bug: bindings are assigned exactly once.
    #[error("handle '{0}' is already bound")]
    DuplicateHandle(String),
}

impl From<RegistryError> for StepError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownHandle(name) => StepError::MissingDependency(name),
            RegistryError::DuplicateHandle(name) => StepError::DuplicateHandle(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handle_maps_to_missing_dependency() {
        let err: StepError = RegistryError::UnknownHandle("gateway".to_string()).into();
        assert_eq!(err, StepError::MissingDependency("gateway".to_string()));
    }

    #[test]
    fn duplicate_handle_maps_to_duplicate() {
        let err: StepError = RegistryError::DuplicateHandle("vpc".to_string()).into();
        assert_eq!(err, StepError::DuplicateHandle("vpc".to_string()));
    }
}
