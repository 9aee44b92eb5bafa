//! Session, operation, and subscription/observation engine for the LwM2M
//! data-model core (spec §4.C-§4.E).
//!
//! The other crates in this workspace (`lwm2m-types`, `lwm2m-codec`,
//! `lwm2m-transport`) are leaf concerns; this crate is where an application
//! actually builds operations against a connected session, so it is what
//! most downstream code depends on directly.

pub mod operation;
pub mod response;
pub mod session;
pub mod subscribe;

pub use operation::{
    AttributeValue, ClientEntry, DefineOperation, DeleteOperation, DiscoverOperation,
    ExecuteOperation, GetOperation, ListClientsOperation, SetOperation, SubscribeOperation,
};
pub use response::Response;
pub use session::{Session, SessionConfig, SessionKind};
pub use subscribe::{ChangeSet, ClientEvent, ExecuteArguments, Subscription, SubscriptionKind};
