//! Define (spec §4.D): registers new object/resource definitions with the
//! daemon and mirrors them into the session's local registry on success.
//!
//! Define's payload is schema, not data, so it doesn't fit the
//! `Objects`/`Resource`/`Value` tree the other operations share (SPEC_FULL.md
//! §C): each definition is carried as a JSON-encoded string, one leaf per
//! object, using the same carrier the teacher's config layer reaches for
//! whenever a value doesn't fit its primary wire shape.

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::{ContentTree, ObjectsTree, TreeLeaf};
use lwm2m_codec::wire::{Message, MessageType, ResponseCode, SubType};
use lwm2m_types::{Error, InstanceId, ObjectDefinition, Path, ResourceId, ResourceValue, Result};

use crate::session::Session;

pub struct DefineOperation {
    session: Arc<Session>,
    definitions: Vec<ObjectDefinition>,
    performed: bool,
}

impl DefineOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::clone(session),
            definitions: Vec::new(),
            performed: false,
        }
    }

    /// Queues a definition. Rejects a second definition for the same object
    /// ID within this operation (spec §4.A: definitions are immutable once
    /// created, so a redefine attempt is always a mistake, not a last-wins
    /// update).
    pub fn add_definition(&mut self, definition: ObjectDefinition) -> Result<()> {
        definition.validate().map_err(Error::DefinitionInvalid)?;
        if self.definitions.iter().any(|d| d.object_id == definition.object_id) {
            return Err(Error::AlreadyDefined);
        }
        self.definitions.push(definition);
        Ok(())
    }

    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        self.session.begin_perform()?;
        if timeout.is_zero() {
            return Err(Error::OperationInvalid);
        }
        if self.definitions.is_empty() {
            return Err(Error::OperationInvalid);
        }
        if !self.session.is_connected() {
            return Err(Error::SessionNotConnected);
        }

        let leaves: Vec<TreeLeaf> = self
            .definitions
            .iter()
            .map(|def| {
                let json = serde_json::to_string(def).map_err(|e| Error::Internal(e.to_string()))?;
                Ok(TreeLeaf {
                    path: Path::resource(def.object_id, InstanceId(0), ResourceId(0)),
                    value: Some(ResourceValue::String(json)),
                    subscribe: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tree = ObjectsTree::build(&leaves);
        let message = Message {
            message_type: MessageType::Request,
            sub_type: SubType::Define,
            session_id: self.session.session_id(),
            response_code: None,
            content: ContentTree::Objects(tree),
        };
        let xml = message.to_xml()?;
        self.session.send_request(xml.as_bytes())?;
        let bytes = self.session.recv_response(timeout)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| Error::ResponseInvalid)?;
        let response = Message::from_xml(text).map_err(|_| Error::ResponseInvalid)?;
        if response.response_code == Some(ResponseCode::FailureBadRequest) {
            self.performed = true;
            return Err(Error::Response);
        }

        for definition in self.definitions.drain(..) {
            self.session.registry().import_object(definition)?;
        }
        self.performed = true;
        Ok(())
    }

    pub fn free(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use lwm2m_types::ObjectId;

    #[test]
    fn duplicate_object_id_within_one_operation_is_already_defined() {
        let session = Session::new(SessionKind::Client);
        let mut op = DefineOperation::new(&session);
        op.add_definition(ObjectDefinition::new(ObjectId(10), "Test", 0, None)).unwrap();
        let err = op
            .add_definition(ObjectDefinition::new(ObjectId(10), "Test again", 0, None))
            .unwrap_err();
        assert_eq!(err, Error::AlreadyDefined);
    }

    #[test]
    fn invalid_definition_is_rejected_at_add_time() {
        let session = Session::new(SessionKind::Client);
        let mut op = DefineOperation::new(&session);
        let err = op.add_definition(ObjectDefinition::new(ObjectId(10), "", 0, None)).unwrap_err();
        assert!(matches!(err, Error::DefinitionInvalid(_)));
    }

    #[test]
    fn perform_with_no_definitions_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = DefineOperation::new(&session);
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::OperationInvalid);
    }
}
