//! Subscribe / Observe (spec §4.D, §4.E).
//!
//! Activates or cancels change and execute subscriptions in a single round
//! trip. Unlike [`super::set::SetOperation`]'s last-wins tie-break, adding
//! the same path twice in one operation is rejected outright — there is no
//! sensible way to both subscribe and cancel the same path in one perform
//! (resolved Open Question, DESIGN.md). A successful perform installs each
//! change/execute subscription into the session's per-path index so the
//! fan-out in [`crate::subscribe::dispatch`] can find it; a successful
//! cancel removes every matching subscription of that kind already
//! installed at the path.

use std::sync::Arc;
use std::time::Duration;

use lwm2m_codec::tree::{ContentTree, ObjectsTree, SubscribeTag, TreeLeaf};
use lwm2m_codec::wire::{Message, MessageType, ResponseCode, SubType};
use lwm2m_types::{Error, Path, Result};

use crate::response::Response;
use crate::session::Session;
use crate::subscribe::{ChangeSet, ExecuteArguments, Subscription, SubscriptionKind};

enum PendingKind {
    Change(Box<dyn Fn(&ChangeSet) + Send + Sync>),
    Execute(Box<dyn Fn(&ExecuteArguments) + Send + Sync>),
    CancelChange,
    CancelExecute,
}

struct Pending {
    path: Path,
    kind: PendingKind,
}

pub struct SubscribeOperation {
    session: Arc<Session>,
    pending: Vec<Pending>,
    response: Option<Response>,
    performed: bool,
    installed: Vec<Subscription>,
}

impl SubscribeOperation {
    pub fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::clone(session),
            pending: Vec::new(),
            response: None,
            performed: false,
            installed: Vec::new(),
        }
    }

    fn check_new_path(&self, path: Path) -> Result<()> {
        if self.pending.iter().any(|p| p.path == path) {
            return Err(Error::AddInvalid);
        }
        Ok(())
    }

    /// Subscribes to value changes at `path` (any depth).
    pub fn add_change(
        &mut self,
        path: Path,
        callback: impl Fn(&ChangeSet) + Send + Sync + 'static,
    ) -> Result<()> {
        self.check_new_path(path)?;
        self.pending.push(Pending { path, kind: PendingKind::Change(Box::new(callback)) });
        Ok(())
    }

    /// Subscribes to executions of the resource at `path`. `AddInvalid` if
    /// `path` is not a resource path — only resources are executable.
    pub fn add_execute(
        &mut self,
        path: Path,
        callback: impl Fn(&ExecuteArguments) + Send + Sync + 'static,
    ) -> Result<()> {
        if !path.is_resource() {
            return Err(Error::AddInvalid);
        }
        self.check_new_path(path)?;
        self.pending.push(Pending { path, kind: PendingKind::Execute(Box::new(callback)) });
        Ok(())
    }

    pub fn add_cancel_change(&mut self, path: Path) -> Result<()> {
        self.check_new_path(path)?;
        self.pending.push(Pending { path, kind: PendingKind::CancelChange });
        Ok(())
    }

    pub fn add_cancel_execute(&mut self, path: Path) -> Result<()> {
        if !path.is_resource() {
            return Err(Error::AddInvalid);
        }
        self.check_new_path(path)?;
        self.pending.push(Pending { path, kind: PendingKind::CancelExecute });
        Ok(())
    }

    pub fn perform(&mut self, timeout: Duration) -> Result<()> {
        self.session.begin_perform()?;
        if timeout.is_zero() {
            return Err(Error::OperationInvalid);
        }
        if self.pending.is_empty() {
            return Err(Error::OperationInvalid);
        }
        if !self.session.is_connected() {
            return Err(Error::SessionNotConnected);
        }

        let leaves: Vec<TreeLeaf> = self
            .pending
            .iter()
            .map(|p| TreeLeaf {
                path: p.path,
                value: None,
                subscribe: Some(match &p.kind {
                    PendingKind::Change(_) => SubscribeTag::SubscribeToChange,
                    PendingKind::Execute(_) => SubscribeTag::SubscribeToExecute,
                    PendingKind::CancelChange => SubscribeTag::CancelSubscribeToChange,
                    PendingKind::CancelExecute => SubscribeTag::CancelSubscribeToExecute,
                }),
            })
            .collect();

        let tree = ObjectsTree::build(&leaves);
        let message = Message {
            message_type: MessageType::Request,
            sub_type: SubType::Subscribe,
            session_id: self.session.session_id(),
            response_code: None,
            content: ContentTree::Objects(tree),
        };
        let xml = message.to_xml()?;
        self.session.send_request(xml.as_bytes())?;
        let bytes = self.session.recv_response(timeout)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| Error::ResponseInvalid)?;
        let response_message = Message::from_xml(text).map_err(|_| Error::ResponseInvalid)?;
        if response_message.response_code == Some(ResponseCode::FailureBadRequest) {
            return Err(Error::ResponseInvalid);
        }
        let response = match response_message.content {
            ContentTree::Objects(tree) => Response::from_tree(&tree),
            ContentTree::Clients(_) => return Err(Error::ResponseInvalid),
        };

        let mut all_success = true;
        for p in self.pending.drain(..) {
            let success = response.get_path_result(p.path).is_success();
            all_success &= success;
            if !success {
                continue;
            }
            match p.kind {
                PendingKind::Change(callback) => {
                    let sub = Subscription::new_change(&self.session, p.path, callback);
                    self.session.add_subscription(p.path, sub.clone());
                    self.installed.push(sub);
                }
                PendingKind::Execute(callback) => {
                    let sub = Subscription::new_execute(&self.session, p.path, callback);
                    self.session.add_subscription(p.path, sub.clone());
                    self.installed.push(sub);
                }
                PendingKind::CancelChange => cancel_matching(&self.session, p.path, SubscriptionKind::Change),
                PendingKind::CancelExecute => cancel_matching(&self.session, p.path, SubscriptionKind::Execute),
            }
        }

        self.response = Some(response);
        self.performed = true;
        if all_success {
            Ok(())
        } else {
            Err(Error::Response)
        }
    }

    pub fn get_response(&self) -> Result<&Response> {
        if !self.performed {
            return Err(Error::OperationInvalid);
        }
        self.response.as_ref().ok_or(Error::ResponseInvalid)
    }

    /// The subscriptions activated by this perform, in add order. Cancel
    /// entries never appear here — use the handle returned from a prior
    /// `add_change`/`add_execute` perform to cancel via [`Subscription::cancel`]
    /// instead, or add a matching `add_cancel_*` path on a later operation.
    pub fn subscriptions(&self) -> Result<&[Subscription]> {
        if !self.performed {
            return Err(Error::OperationInvalid);
        }
        Ok(&self.installed)
    }

    pub fn free(self) {}
}

fn cancel_matching(session: &Arc<Session>, path: Path, kind: SubscriptionKind) {
    let matching: Vec<Subscription> = match session.client_subscriptions.get(&path) {
        Some(subs) => subs.iter().filter(|s| s.kind() == kind).cloned().collect(),
        None => return,
    };
    for sub in matching {
        sub.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use lwm2m_types::{InstanceId, ObjectId, ResourceId};

    #[test]
    fn duplicate_path_in_one_operation_is_add_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = SubscribeOperation::new(&session);
        let path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(6));
        op.add_change(path, |_| {}).unwrap();
        let err = op.add_cancel_change(path).unwrap_err();
        assert_eq!(err, Error::AddInvalid);
    }

    #[test]
    fn execute_subscribe_rejects_non_resource_path() {
        let session = Session::new(SessionKind::Client);
        let mut op = SubscribeOperation::new(&session);
        let err = op.add_execute(Path::instance(ObjectId(3), InstanceId(0)), |_| {}).unwrap_err();
        assert_eq!(err, Error::AddInvalid);
    }

    #[test]
    fn perform_with_no_subscriptions_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let mut op = SubscribeOperation::new(&session);
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::OperationInvalid);
    }

    #[test]
    fn perform_on_disconnected_session_is_session_not_connected() {
        let session = Session::new(SessionKind::Client);
        let mut op = SubscribeOperation::new(&session);
        op.add_change(Path::object(ObjectId(3)), |_| {}).unwrap();
        let err = op.perform(Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, Error::SessionNotConnected);
    }

    #[test]
    fn subscriptions_before_perform_is_operation_invalid() {
        let session = Session::new(SessionKind::Client);
        let op = SubscribeOperation::new(&session);
        assert_eq!(op.subscriptions().unwrap_err(), Error::OperationInvalid);
    }
}
