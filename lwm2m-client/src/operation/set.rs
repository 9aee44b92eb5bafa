//! Set / Write (spec §4.D).
//!
//! Array writes use sparse update semantics: an `add_array_value` leaf
//! targets a single resource-instance index and merges with whatever the
//! daemon already holds for the rest of the array (spec §3, §8 property 4).

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::TreeLeaf;
use lwm2m_codec::wire::SubType;
use lwm2m_types::{Error, InstanceId, ObjectId, Path, Registry, ResourceValue, Result};

use super::Engine;
use crate::response::Response;
use crate::session::Session;

pub struct SetOperation {
    engine: Engine,
}

impl SetOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self { engine: Engine::new(session) }
    }

    /// Creates an object instance. When `instance` is `None` the core lets
    /// the daemon assign one (spec §4.D "when the object-instance ID is
    /// omitted, the core assigns one").
    pub fn add_create_instance(&mut self, object: ObjectId, instance: Option<InstanceId>) {
        let path = match instance {
            Some(i) => Path::instance(object, i),
            None => Path::object(object),
        };
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: None,
            subscribe: None,
        });
    }

    /// Creates an optional resource without yet assigning it a value.
    pub fn add_create_resource(&mut self, path: Path) -> Result<()> {
        if !path.is_resource() {
            return Err(Error::AddInvalid);
        }
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: None,
            subscribe: None,
        });
        Ok(())
    }

    /// Adds a scalar value at a resource path. If `registry` is given and
    /// the resource is already defined there, a locally-detectable type
    /// mismatch is caught immediately (spec §4.D "type conflicts are
    /// detected locally... at add time when the resource is defined in the
    /// session").
    pub fn add_value(&mut self, path: Path, value: ResourceValue, registry: Option<&Registry>) -> Result<()> {
        if !path.is_resource() {
            return Err(Error::AddInvalid);
        }
        if let Some(registry) = registry {
            if let (Some(object), Some(resource)) = (Some(path.object), path.resource) {
                if registry.is_object_defined(object) {
                    registry.check_type(object, resource, &value)?;
                }
            }
        }
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: Some(value),
            subscribe: None,
        });
        Ok(())
    }

    /// Adds a whole array, replacing every instance present in `values` in
    /// one batch (still sparse: indices absent from `values` are
    /// untouched).
    pub fn add_array(&mut self, resource_path: Path, values: impl IntoIterator<Item = (u16, ResourceValue)>) -> Result<()> {
        if !resource_path.is_resource() {
            return Err(Error::AddInvalid);
        }
        for (index, value) in values {
            self.add_array_value(resource_path, index, value)?;
        }
        Ok(())
    }

    /// Adds a single array entry at `index` (spec §3 `AddArrayValue`).
    pub fn add_array_value(&mut self, resource_path: Path, index: u16, value: ResourceValue) -> Result<()> {
        if !resource_path.is_resource() {
            return Err(Error::AddInvalid);
        }
        let path = Path::resource_instance(
            resource_path.object,
            resource_path.instance.ok_or(Error::AddInvalid)?,
            resource_path.resource.ok_or(Error::AddInvalid)?,
            index.into(),
        );
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: Some(value),
            subscribe: None,
        });
        Ok(())
    }

    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        self.engine.perform(SubType::Set, timeout)
    }

    pub fn get_response(&self) -> Result<&Response> {
        self.engine.get_response()
    }

    pub fn free(self) {}
}
