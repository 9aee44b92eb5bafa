//! Discover (spec §4.D): server-side operation returning, per path, the set
//! of LwM2M attributes (`pmin`, `pmax`, `gt`, `lt`, `st`, ...) attached to it.
//!
//! Attributes are carried on the wire the same way a Get's scalar value is —
//! as `Resource`/`ResourceInstance` `Value` text — but the text holds a
//! `name=value;name=value` attribute set rather than a single typed value,
//! since Discover's response shape is structurally identical to Get's
//! (one entry per path) and only the payload grammar differs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::TreeLeaf;
use lwm2m_codec::wire::SubType;
use lwm2m_types::{Error, Path, Result};

use super::Engine;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
}

pub struct DiscoverOperation {
    engine: Engine,
}

impl DiscoverOperation {
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
        self.engine.perform(SubType::Discover, timeout)
    }

    /// Parses the attribute set returned for `path`. An attribute whose
    /// value fails to parse as a float is skipped rather than failing the
    /// whole discover (an unexpected attribute shouldn't sink the response).
    pub fn get_attributes(&self, path: Path) -> Result<BTreeMap<String, AttributeValue>> {
        let response = self.engine.get_response()?;
        let text = response.get_string(path)?;
        let mut attrs = BTreeMap::new();
        for pair in text.split(';').filter(|p| !p.is_empty()) {
            let Some((name, value)) = pair.split_once('=') else { continue };
            let parsed = if let Ok(i) = value.parse::<i64>() {
                AttributeValue::Integer(i)
            } else if let Ok(f) = value.parse::<f64>() {
                AttributeValue::Float(f)
            } else {
                continue;
            };
            attrs.insert(name.to_string(), parsed);
        }
        Ok(attrs)
    }

    pub fn free(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use lwm2m_types::{InstanceId, ObjectId, ResourceId};

    #[test]
    fn perform_on_disconnected_session_is_session_not_connected() {
        let session = Session::new(SessionKind::Client);
        let mut op = DiscoverOperation::new(&session);
        op.add_path(Path::resource(ObjectId(3), InstanceId(0), ResourceId(0)));
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::SessionNotConnected);
    }

    #[test]
    fn attributes_before_perform_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let op = DiscoverOperation::new(&session);
        let err = op.get_attributes(Path::object(ObjectId(3))).unwrap_err();
        assert_eq!(err, Error::OperationInvalid);
    }
}
