//! A live subscription or observation handle (spec §4.E).
//!
//! Ownership makes the source's "dangling pointer after free" failure mode
//! (§9 design note) unrepresentable: a [`Subscription`] is a cheaply
//! cloneable handle over a shared inner record; cancelling it flips a flag
//! and unlinks it from the owning session's index, but any clone still
//! alive simply observes a cancelled, inert subscription rather than a
//! freed one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use lwm2m_types::Path;

use super::change_set::{ChangeSet, ExecuteArguments};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    Change,
    Execute,
}

enum Callback {
    Change(Box<dyn Fn(&ChangeSet) + Send + Sync>),
    Execute(Box<dyn Fn(&ExecuteArguments) + Send + Sync>),
}

struct Inner {
    path: Path,
    kind: SubscriptionKind,
    callback: Callback,
    cancelled: AtomicBool,
    session: Weak<Session>,
}

/// A handle to a registered change or execute subscription. Clone is cheap
/// (shared `Arc`); every clone observes the same cancellation state.
#[derive(Clone)]
pub struct Subscription(Arc<Inner>);

impl Subscription {
    pub(crate) fn new_change(
        session: &Arc<Session>,
        path: Path,
        callback: impl Fn(&ChangeSet) + Send + Sync + 'static,
    ) -> Self {
        Subscription(Arc::new(Inner {
            path,
            kind: SubscriptionKind::Change,
            callback: Callback::Change(Box::new(callback)),
            cancelled: AtomicBool::new(false),
            session: Arc::downgrade(session),
        }))
    }

    pub(crate) fn new_execute(
        session: &Arc<Session>,
        path: Path,
        callback: impl Fn(&ExecuteArguments) + Send + Sync + 'static,
    ) -> Self {
        Subscription(Arc::new(Inner {
            path,
            kind: SubscriptionKind::Execute,
            callback: Callback::Execute(Box::new(callback)),
            cancelled: AtomicBool::new(false),
            session: Arc::downgrade(session),
        }))
    }

    pub fn path(&self) -> Path {
        self.0.path
    }

    pub fn kind(&self) -> SubscriptionKind {
        self.0.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Cancels the subscription and removes it from the owning session's
    /// index. Idempotent; cancelling twice is a no-op the second time.
    pub fn cancel(&self) {
        if self.0.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(session) = self.0.session.upgrade() {
            session.remove_subscription(self.0.path, self);
        }
    }

    pub(crate) fn invoke_change(&self, change: &ChangeSet) {
        if self.is_cancelled() {
            return;
        }
        if let Callback::Change(cb) = &self.0.callback {
            cb(change);
        }
    }

    pub(crate) fn invoke_execute(&self, args: &ExecuteArguments) {
        if self.is_cancelled() {
            return;
        }
        if let Callback::Execute(cb) = &self.0.callback {
            cb(args);
        }
    }

    /// Identity equality for removing a specific handle out of a session's
    /// per-path vector (two `Subscription`s compare equal iff they share the
    /// same inner record).
    pub(crate) fn same_as(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
