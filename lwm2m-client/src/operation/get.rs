//! Get / Read (spec §4.D).

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::TreeLeaf;
use lwm2m_codec::wire::SubType;
use lwm2m_types::{Path, Result};

use super::Engine;
use crate::response::Response;
use crate::session::Session;

/// Batches one or more path reads into a single round trip. Paths may
/// target an object, an object instance, a resource, or a resource
/// instance; the response carries values for every resource that exists
/// under each requested path, with `PathNotFound` for the rest (spec §4.D).
pub struct GetOperation {
    engine: Engine,
}

impl GetOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self { engine: Engine::new(session) }
    }

    pub fn add_path(&mut self, path: Path) {
        self.engine.add_or_replace(TreeLeaf {
            path,
            value: None,
            subscribe: None,
        });
    }

    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        self.engine.perform(SubType::Get, timeout)
    }

    pub fn get_response(&self) -> Result<&Response> {
        self.engine.get_response()
    }

    /// Consumes the operation. Idiomatic Rust already makes every pointer
    /// handed out by `get_response` dangling-unrepresentable via lifetimes
    /// (spec §9 design note); this exists for API parity with the source's
    /// explicit `free`.
    pub fn free(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use lwm2m_types::{Error, ObjectId};

    #[test]
    fn perform_with_no_paths_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = GetOperation::new(&session);
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::OperationInvalid);
    }

    #[test]
    fn perform_with_zero_timeout_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = GetOperation::new(&session);
        op.add_path(Path::object(ObjectId(3)));
        let err = op.perform(Duration::ZERO).unwrap_err();
        assert_eq!(err, Error::OperationInvalid);
    }

    #[test]
    fn perform_on_disconnected_session_is_session_not_connected() {
        let session = Session::new(SessionKind::Client);
        let mut op = GetOperation::new(&session);
        op.add_path(Path::object(ObjectId(3)));
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::SessionNotConnected);
    }
}
