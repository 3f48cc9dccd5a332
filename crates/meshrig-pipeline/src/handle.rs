//! Resource handles and the write-once handle registry
//!
//! Every provisioned cloud object is recorded as a [`ResourceHandle`]: an
//! opaque provider-assigned identifier bound to a logical name. Later steps
//! resolve their dependencies through the registry instead of holding
//! references to earlier steps.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of cloud object a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    Subnet,
    PublicGateway,
    SecurityGroup,
    Instance,
    Secret,
    DomainMapping,
    TailscaleKey,
    ResourceGroup,
    Project,
    Application,
    SshKey,
    Image,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::PublicGateway => "public-gateway",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::Instance => "instance",
            ResourceKind::Secret => "secret",
            ResourceKind::DomainMapping => "domain-mapping",
            ResourceKind::TailscaleKey => "tailscale-key",
            ResourceKind::ResourceGroup => "resource-group",
            ResourceKind::Project => "project",
            ResourceKind::Application => "application",
            ResourceKind::SshKey => "ssh-key",
            ResourceKind::Image => "image",
        };
        write!(f, "{}", s)
    }
}

/// An opaque provider-assigned identifier bound to a logical name
///
/// Created exactly once by the step that provisioned the underlying object
/// and immutable thereafter. A step that deletes an upstream object (for
/// example replacing an existing domain mapping) registers a distinct
/// tombstone handle rather than removing the original binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub logical_name: String,
    pub provider_id: String,
    pub kind: ResourceKind,
}

impl ResourceHandle {
    pub fn new(
        logical_name: impl Into<String>,
        provider_id: impl Into<String>,
        kind: ResourceKind,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            provider_id: provider_id.into(),
            kind,
        }
    }
}

/// Write-once mapping from logical names to provider identifiers
///
/// A provisioning run only ever grows the registry: there is no update or
/// delete, so a later step can never silently observe a stale overwritten
/// identifier. Insertion order is preserved for operator-facing reports.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    handles: HashMap<String, ResourceHandle>,
    order: Vec<String>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handle to its logical name.
    ///
    /// Fails with [`RegistryError::DuplicateHandle`] if the name is already
    /// bound; the existing binding is left untouched.
    pub fn put(&mut self, handle: ResourceHandle) -> Result<(), RegistryError> {
        if self.handles.contains_key(&handle.logical_name) {
            return Err(RegistryError::DuplicateHandle(handle.logical_name.clone()));
        }
        self.order.push(handle.logical_name.clone());
        self.handles.insert(handle.logical_name.clone(), handle);
        Ok(())
    }

    /// Look up the handle bound to a logical name.
    pub fn get(&self, logical_name: &str) -> Result<&ResourceHandle, RegistryError> {
        self.handles
            .get(logical_name)
            .ok_or_else(|| RegistryError::UnknownHandle(logical_name.to_string()))
    }

    /// Look up only the provider identifier for a logical name.
    pub fn provider_id(&self, logical_name: &str) -> Result<&str, RegistryError> {
        Ok(self.get(logical_name)?.provider_id.as_str())
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.handles.contains_key(logical_name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// All registered handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.order.iter().filter_map(|name| self.handles.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc_handle() -> ResourceHandle {
        ResourceHandle::new("vpc", "r006-1234", ResourceKind::Vpc)
    }

    #[test]
    fn put_then_get() {
        let mut registry = HandleRegistry::new();
        registry.put(vpc_handle()).unwrap();

        let handle = registry.get("vpc").unwrap();
        assert_eq!(handle.provider_id, "r006-1234");
        assert_eq!(handle.kind, ResourceKind::Vpc);
        assert_eq!(registry.provider_id("vpc").unwrap(), "r006-1234");
    }

    #[test]
    fn put_is_write_once() {
        let mut registry = HandleRegistry::new();
        registry.put(vpc_handle()).unwrap();

        let err = registry
            .put(ResourceHandle::new("vpc", "r006-9999", ResourceKind::Vpc))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateHandle("vpc".to_string()));

        // The original binding is untouched.
        assert_eq!(registry.provider_id("vpc").unwrap(), "r006-1234");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_unbound_name_fails() {
        let registry = HandleRegistry::new();
        let err = registry.get("subnet").unwrap_err();
        assert_eq!(err, RegistryError::UnknownHandle("subnet".to_string()));
    }

    #[test]
    fn handles_preserve_insertion_order() {
        let mut registry = HandleRegistry::new();
        registry.put(vpc_handle()).unwrap();
        registry
            .put(ResourceHandle::new("subnet", "s-1", ResourceKind::Subnet))
            .unwrap();
        registry
            .put(ResourceHandle::new("gateway", "g-1", ResourceKind::PublicGateway))
            .unwrap();

        let names: Vec<&str> = registry.handles().map(|h| h.logical_name.as_str()).collect();
        assert_eq!(names, vec!["vpc", "subnet", "gateway"]);
    }
}
