//! Execute (spec §4.D): invokes an executable resource, optionally with an
//! opaque byte-string argument.

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::TreeLeaf;
use lwm2m_codec::wire::SubType;
use lwm2m_types::{Error, Opaque, Path, ResourceValue, Result};

use super::Engine;
use crate::response::Response;
use crate::session::Session;

pub struct ExecuteOperation {
    engine: Engine,
}

impl ExecuteOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self { engine: Engine::new(session) }
    }

    /// Targets a resource for execution, with an optional argument payload.
    /// `AddInvalid` when `path` is not a resource path — executable
    /// resources never have instances (spec §4.D).
    pub fn add_path(&mut self, path: Path, argument: Option<Vec<u8>>) -> Result<()> {
        if !path.is_resource() {
            return Err(Error::AddInvalid);
        }
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: argument.map(|bytes| ResourceValue::Opaque(Opaque(bytes))),
            subscribe: None,
        });
        Ok(())
    }

    /// Only one target is meaningful per execute round trip (spec §4.D);
    /// calling this a second time replaces the prior target rather than
    /// batching, unlike Get/Set/Delete which accept many paths.
    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        if self.engine.leaves().len() > 1 {
            return Err(Error::OperationInvalid);
        }
        self.engine.perform(SubType::Execute, timeout)
    }

    pub fn get_response(&self) -> Result<&Response> {
        self.engine.get_response()
    }

    pub fn free(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use lwm2m_types::{InstanceId, ObjectId, ResourceId};

    #[test]
    fn instance_level_target_is_add_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = ExecuteOperation::new(&session);
        let err = op.add_path(Path::instance(ObjectId(3), InstanceId(0)), None).unwrap_err();
        assert_eq!(err, Error::AddInvalid);
    }

    #[test]
    fn argument_is_carried_as_opaque_value() {
        let session = Session::new(SessionKind::Client);
        let mut op = ExecuteOperation::new(&session);
        let path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(4));
        op.add_path(path, Some(vec![1, 2, 3])).unwrap();
        assert_eq!(op.engine.leaves().len(), 1);
        assert_eq!(op.engine.leaves()[0].value, Some(ResourceValue::Opaque(Opaque(vec![1, 2, 3]))));
    }
}
