//! [SUBSCRIPTION / OBSERVATION ENGINE] (spec §4.E).

pub mod change_set;
pub mod dispatch;
pub mod subscription;

use lwm2m_types::Path;

pub use change_set::{ChangeSet, ExecuteArguments};
pub use subscription::{Subscription, SubscriptionKind};

/// A client registration lifecycle event, carrying the registering
/// client's ID. Supplemented per SPEC_FULL.md §C — `original_source`'s
/// registration table fires these internally but spec.md's distillation
/// never surfaces them to a server-kind session. Register/Update also carry
/// the client's registered object-instance paths
/// (`original_source/api/tests/test_server_events.cc`'s registered-entity-path
/// iterator); Deregister does not, since by then there is nothing left to
/// enumerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Register(u16, Vec<Path>),
    Update(u16, Vec<Path>),
    Deregister(u16),
}

impl ClientEvent {
    pub fn client_id(&self) -> u16 {
        match self {
            ClientEvent::Register(id, _) | ClientEvent::Update(id, _) | ClientEvent::Deregister(id) => *id,
        }
    }

    /// The registered entity paths, if this event carries any.
    pub fn registered_paths(&self) -> &[Path] {
        match self {
            ClientEvent::Register(_, paths) | ClientEvent::Update(_, paths) => paths,
            ClientEvent::Deregister(_) => &[],
        }
    }
}
