//! Delete (spec §4.D), plus the ranged resource-instance delete
//! `original_source` exposes and spec.md's distillation only gestures at
//! ("a range of resource-instance indices") — SPEC_FULL.md §C.

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::TreeLeaf;
use lwm2m_codec::wire::SubType;
use lwm2m_types::{Error, Path, Result, MAX_ID};

use super::Engine;
use crate::response::Response;
use crate::session::Session;

pub struct DeleteOperation {
    engine: Engine,
}

impl DeleteOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self { engine: Engine::new(session) }
    }

    /// Deletes an object instance, an optional resource, or a single
    /// resource instance, depending on `path`'s depth.
    pub fn add_path(&mut self, path: Path) -> Result<()> {
        if path.is_object() {
            return Err(Error::AddInvalid);
        }
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: None,
            subscribe: None,
        });
        Ok(())
    }

    /// Deletes `count` resource instances starting at `start`.
    /// `AddInvalid` when `count < 1` or the range runs past `MAX_ID`
    /// (spec §4.D).
    pub fn add_delete_range(&mut self, resource_path: Path, start: u16, count: u32) -> Result<()> {
        if !resource_path.is_resource() {
            return Err(Error::AddInvalid);
        }
        if count < 1 || count > MAX_ID as u32 {
            return Err(Error::AddInvalid);
        }
        let end = start as u32 + count;
        if end > MAX_ID as u32 + 1 {
            return Err(Error::AddInvalid);
        }
        for index in start as u32..end {
            let path = Path::resource_instance(
                resource_path.object,
                resource_path.instance.ok_or(Error::AddInvalid)?,
                resource_path.resource.ok_or(Error::AddInvalid)?,
                (index as u16).into(),
            );
            self.engine.add_or_replace(TreeLeaf {
                path,
                value: None,
                subscribe: None,
            });
        }
        Ok(())
    }

    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        self.engine.perform(SubType::Delete, timeout)
    }

    pub fn get_response(&self) -> Result<&Response> {
        self.engine.get_response()
    }

    pub fn free(self) {}
}
