//! [DEFINITION REGISTRY] — canonical store of what objects and resources
//! exist and what their shapes are (spec §4.A).
//!
//! `DashMap`-keyed, the same concurrency primitive the teacher's
//! `ModuleRegistry` uses for a keyed collection that is written rarely
//! (definitions are immutable once created) and read constantly (every
//! operation perform resolves paths against it).

use crate::definition::{AccessMode, ObjectDefinition, ResourceDefinition};
use crate::error::{Error, Result};
use crate::id::{ObjectId, ResourceId};
use crate::value::{ResourceKind, ResourceValue};
use dashmap::mapref::one::Ref;
use dashmap::DashMap;

pub struct Registry {
    objects: DashMap<ObjectId, ObjectDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    pub fn define_object(
        &self,
        id: ObjectId,
        name: impl Into<String>,
        min_instances: u16,
        max_instances: Option<u16>,
    ) -> Result<()> {
        if self.objects.contains_key(&id) {
            return Err(Error::AlreadyDefined);
        }
        let def = ObjectDefinition::new(id, name, min_instances, max_instances);
        def.validate().map_err(Error::DefinitionInvalid)?;
        self.objects.insert(id, def);
        Ok(())
    }

    pub fn define_resource(
        &self,
        object_id: ObjectId,
        resource_id: ResourceId,
        name: impl Into<String>,
        kind: ResourceKind,
        min_instances: u16,
        max_instances: Option<u16>,
        access: AccessMode,
    ) -> Result<()> {
        let mut entry = self.objects.get_mut(&object_id).ok_or(Error::NotDefined)?;
        if entry.resources.contains_key(&resource_id) {
            return Err(Error::AlreadyDefined);
        }
        let is_multiple = kind.is_array() || max_instances.map_or(false, |m| m > 1);
        let def = ResourceDefinition {
            resource_id,
            name: name.into(),
            kind,
            is_multiple,
            min_instances,
            max_instances,
            access,
            defaults: Vec::new(),
        };
        def.validate().map_err(Error::DefinitionInvalid)?;
        entry.resources.insert(resource_id, def);
        Ok(())
    }

    pub fn is_object_defined(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get_object_definition(&self, id: ObjectId) -> Option<Ref<'_, ObjectId, ObjectDefinition>> {
        self.objects.get(&id)
    }

    pub fn get_resource_definition(&self, object_id: ObjectId, resource_id: ResourceId) -> Option<ResourceDefinition> {
        self.objects
            .get(&object_id)
            .and_then(|o| o.resources.get(&resource_id).cloned())
    }

    /// A finite, non-restartable snapshot of every defined object. Iteration
    /// order is unspecified but stable for the returned iterator (§4.A).
    pub fn iterate_definitions(&self) -> impl Iterator<Item = ObjectDefinition> {
        self.objects
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Imports an object definition produced elsewhere — used by the
    /// Define operation after a successful perform to mirror the daemon's
    /// newly-learned definitions into the local session registry (§4.D).
    pub fn import_object(&self, def: ObjectDefinition) -> Result<()> {
        def.validate().map_err(Error::DefinitionInvalid)?;
        if self.objects.contains_key(&def.object_id) {
            return Err(Error::AlreadyDefined);
        }
        self.objects.insert(def.object_id, def);
        Ok(())
    }

    /// Checks whether `value`'s kind matches the resource's defined kind,
    /// returning `TypeMismatch` locally (§4.D "Set ... type conflicts are
    /// detected locally when the resource is defined in the session").
    pub fn check_type(&self, object_id: ObjectId, resource_id: ResourceId, value: &ResourceValue) -> Result<()> {
        let def = self
            .get_resource_definition(object_id, resource_id)
            .ok_or(Error::NotDefined)?;
        if def.kind != value.kind() {
            return Err(Error::TypeMismatch);
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_object_twice_is_already_defined() {
        let reg = Registry::new();
        reg.define_object(ObjectId(3), "Device", 1, Some(1)).unwrap();
        let err = reg.define_object(ObjectId(3), "Device", 1, Some(1)).unwrap_err();
        assert_eq!(err, Error::AlreadyDefined);
    }

    #[test]
    fn define_resource_requires_object() {
        let reg = Registry::new();
        let err = reg
            .define_resource(ObjectId(3), ResourceId(0), "Manufacturer", ResourceKind::String, 0, Some(1), AccessMode::ReadOnly)
            .unwrap_err();
        assert_eq!(err, Error::NotDefined);
    }

    #[test]
    fn iterate_definitions_is_a_stable_snapshot() {
        let reg = Registry::new();
        reg.define_object(ObjectId(3), "Device", 1, Some(1)).unwrap();
        reg.define_object(ObjectId(4), "Connectivity", 0, None).unwrap();
        let mut names: Vec<String> = reg.iterate_definitions().map(|d| d.name).collect();
        names.sort();
        assert_eq!(names, vec!["Connectivity".to_string(), "Device".to_string()]);
    }

    #[test]
    fn check_type_mismatch() {
        let reg = Registry::new();
        reg.define_object(ObjectId(3), "Device", 1, Some(1)).unwrap();
        reg.define_resource(ObjectId(3), ResourceId(0), "Manufacturer", ResourceKind::String, 0, Some(1), AccessMode::ReadOnly)
            .unwrap();
        let err = reg
            .check_type(ObjectId(3), ResourceId(0), &ResourceValue::Integer(1))
            .unwrap_err();
        assert_eq!(err, Error::TypeMismatch);
    }
}
