//! [OPERATION ENGINE] (spec §4.D).
//!
//! Every concrete operation (`GetOperation`, `SetOperation`, ...) wraps a
//! private [`Engine`] that carries the shared "accumulate paths, perform a
//! round trip, expose a response" skeleton. Each public struct is a
//! distinct type exposing only the `add_*` methods valid for its kind, so
//! a `SetOperation` cannot be performed where a `GetOperation` is expected
//! and vice versa — the teacher's "one shared trait, per-kind
//! specialisation" idea (`ServiceModule`), adapted here via composition
//! rather than a generic marker-type parameter, since each kind's `add_*`
//! surface differs enough (scalars and array entries for Set, a byte
//! payload for Execute, definitions for Define) that a single generic
//! struct would need as many inherent-impl blocks as concrete structs do
//! anyway.

pub mod define;
pub mod delete;
pub mod discover;
pub mod execute;
pub mod get;
pub mod list_clients;
pub mod set;
pub mod subscribe;

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::{ContentTree, ObjectsTree, TreeLeaf};
use lwm2m_codec::wire::{Message, MessageType, ResponseCode, SubType};
use lwm2m_types::{Error, Result};
use tracing::debug;

use crate::response::Response;
use crate::session::Session;

pub use define::DefineOperation;
pub use delete::DeleteOperation;
pub use discover::{AttributeValue, DiscoverOperation};
pub use execute::ExecuteOperation;
pub use get::GetOperation;
pub use list_clients::{ClientEntry, ListClientsOperation};
pub use set::SetOperation;
pub use subscribe::SubscribeOperation;

pub(crate) struct Engine {
    session: Arc<Session>,
    leaves: Vec<TreeLeaf>,
    response: Option<Response>,
    performed: bool,
}

impl Engine {
    pub(crate) fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::clone(session),
            leaves: Vec::new(),
            response: None,
            performed: false,
        }
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Adding the same path twice: the later add replaces the earlier
    /// (spec §4.D tie-break, last-wins; resolved Open Question in
    /// DESIGN.md).
    pub(crate) fn add_or_replace(&mut self, leaf: TreeLeaf) {
        self.leaves.retain(|l| l.path != leaf.path);
        self.leaves.push(leaf);
    }

    pub(crate) fn leaves(&self) -> &[TreeLeaf] {
        &self.leaves
    }

    pub(crate) fn perform(&mut self, sub_type: SubType, timeout: Duration) -> Result<()> {
        let response = perform_round_trip(&self.session, sub_type, &self.leaves, timeout)?;
        let all_success = response.paths().all(|p| response.get_path_result(p).is_success());
        self.response = Some(response);
        self.performed = true;
        if all_success {
            Ok(())
        } else {
            Err(Error::Response)
        }
    }

    pub(crate) fn get_response(&self) -> Result<&Response> {
        if !self.performed {
            return Err(Error::OperationInvalid);
        }
        self.response.as_ref().ok_or(Error::ResponseInvalid)
    }
}

/// Shared request/response round trip used by every path-tree operation
/// (Get/Set/Delete/Execute/Discover). List Clients and Define have their
/// own content shape and do not go through this helper.
pub(crate) fn perform_round_trip(
    session: &Arc<Session>,
    sub_type: SubType,
    leaves: &[TreeLeaf],
    timeout: Duration,
) -> Result<Response> {
    session.begin_perform()?;
    if timeout.is_zero() {
        return Err(Error::OperationInvalid);
    }
    if leaves.is_empty() {
        return Err(Error::OperationInvalid);
    }
    if !session.is_connected() {
        return Err(Error::SessionNotConnected);
    }

    let tree = ObjectsTree::build(leaves);
    let message = Message {
        message_type: MessageType::Request,
        sub_type,
        session_id: session.session_id(),
        response_code: None,
        content: ContentTree::Objects(tree),
    };
    let xml = message.to_xml()?;
    session.send_request(xml.as_bytes())?;
    let bytes = session.recv_response(timeout)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| Error::ResponseInvalid)?;
    let response_message = Message::from_xml(text).map_err(|_| Error::ResponseInvalid)?;
    if response_message.response_code == Some(ResponseCode::FailureBadRequest) {
        debug!(session_id = session.session_id(), ?sub_type, "daemon returned FailureBadRequest");
        return Err(Error::ResponseInvalid);
    }
    match response_message.content {
        ContentTree::Objects(tree) => Ok(Response::from_tree(&tree)),
        ContentTree::Clients(_) => {
            debug!(session_id = session.session_id(), ?sub_type, "expected an Objects content tree, got Clients");
            Err(Error::ResponseInvalid)
        }
    }
}
