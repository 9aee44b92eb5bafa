//! Object and resource definitions.

use crate::id::{ObjectId, ResourceId};
use crate::value::{ResourceKind, ResourceValue};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AccessMode {
    None,
    ReadOnly,
    WriteOnly,
    ReadWrite,
    Execute,
}

impl AccessMode {
    pub fn is_readable(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    pub fn is_executable(self) -> bool {
        matches!(self, AccessMode::Execute)
    }
}

/// A resource definition within an object: shape, cardinality, access, and
/// optional default value(s). Immutable once created (§4.A "definitions are
/// immutable after creation; there is no redefine").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceDefinition {
    pub resource_id: ResourceId,
    pub name: String,
    pub kind: ResourceKind,
    pub is_multiple: bool,
    pub min_instances: u16,
    pub max_instances: Option<u16>,
    pub access: AccessMode,
    pub defaults: Vec<ResourceValue>,
}

impl ResourceDefinition {
    /// Validates the cross-field invariants from §3/§4.A:
    /// - `Execute` access requires `None` kind and vice versa.
    /// - non-empty name.
    /// - min <= max when both given.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("resource name must not be empty".into());
        }
        if self.access.is_executable() != self.kind.is_executable_kind() {
            return Err("Execute access is only valid on a None-kind resource".into());
        }
        if let Some(max) = self.max_instances {
            if self.min_instances > max {
                return Err("min_instances must not exceed max_instances".into());
            }
        }
        if !self.is_multiple && !self.kind.is_array() && self.max_instances.map_or(false, |m| m > 1) {
            return Err("a single-instance resource cannot declare max_instances > 1".into());
        }
        Ok(())
    }
}

/// An object definition: identity, cardinality, and its resource
/// definitions keyed by resource ID (unique within the object, §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectDefinition {
    pub object_id: ObjectId,
    pub name: String,
    pub min_instances: u16,
    pub max_instances: Option<u16>,
    pub resources: BTreeMap<ResourceId, ResourceDefinition>,
}

impl ObjectDefinition {
    pub fn new(object_id: ObjectId, name: impl Into<String>, min_instances: u16, max_instances: Option<u16>) -> Self {
        Self {
            object_id,
            name: name.into(),
            min_instances,
            max_instances,
            resources: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("object name must not be empty".into());
        }
        if let Some(max) = self.max_instances {
            if self.min_instances > max {
                return Err("min_instances must not exceed max_instances".into());
            }
        }
        Ok(())
    }

    pub fn resource(&self, resource_id: ResourceId) -> Option<&ResourceDefinition> {
        self.resources.get(&resource_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_access_requires_none_kind() {
        let def = ResourceDefinition {
            resource_id: ResourceId(4),
            name: "reboot".into(),
            kind: ResourceKind::None,
            is_multiple: false,
            min_instances: 0,
            max_instances: Some(1),
            access: AccessMode::Execute,
            defaults: vec![],
        };
        assert!(def.validate().is_ok());

        let bad = ResourceDefinition {
            kind: ResourceKind::Integer,
            ..def
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn min_greater_than_max_is_invalid() {
        let def = ObjectDefinition::new(ObjectId(3), "Device", 2, Some(1));
        assert!(def.validate().is_err());
    }
}
