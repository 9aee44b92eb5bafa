//! Notification fan-out (spec §4.E).
//!
//! Grounded on `continuum-core/src/runtime/message_bus.rs`'s
//! `MessageBus::publish`/`glob_matches`: there, a published topic walks
//! registered subscriber globs to find matches; here, a notified path walks
//! its own ancestor chain — innermost (the exact path) first, then each
//! enclosing resource/instance/object — checking the session's per-path
//! subscription index at every step, since a subscription registered on an
//! object or instance covers every resource beneath it.

use lwm2m_codec::tree::ContentTree;
use lwm2m_codec::wire::{Message, SubType};
use lwm2m_types::Opaque;

use super::change_set::{ChangeSet, ExecuteArguments};
use super::subscription::SubscriptionKind;
use super::ClientEvent;
use crate::session::Session;
use std::sync::Arc;

pub fn dispatch_notification(session: &Arc<Session>, message: &Message) {
    match message.sub_type {
        SubType::ClientRegister => dispatch_client_event(session, message, |id, paths| ClientEvent::Register(id, paths)),
        SubType::ClientUpdate => dispatch_client_event(session, message, |id, paths| ClientEvent::Update(id, paths)),
        SubType::ClientDeregister => dispatch_client_event(session, message, |id, _| ClientEvent::Deregister(id)),
        SubType::Observe | SubType::Subscribe | SubType::Execute => dispatch_path_notification(session, message),
        _ => {}
    }
}

fn dispatch_client_event(session: &Arc<Session>, message: &Message, make_event: fn(u16, Vec<lwm2m_types::Path>) -> ClientEvent) {
    let ContentTree::Clients(tree) = &message.content else { return };
    for client in &tree.clients {
        let paths = client
            .objects
            .as_ref()
            .map(|tree| tree.walk().into_iter().map(|(path, _, _)| path).collect())
            .unwrap_or_default();
        session.fire_client_event(make_event(client.id, paths));
    }
}

fn dispatch_path_notification(session: &Arc<Session>, message: &Message) {
    let ContentTree::Objects(tree) = &message.content else { return };
    for (path, value_text, _result) in tree.walk() {
        for ancestor in path.ancestor_chain() {
            let Some(subs) = session.client_subscriptions.get(&ancestor) else { continue };
            for sub in subs.iter() {
                if sub.is_cancelled() {
                    continue;
                }
                match (sub.kind(), message.sub_type) {
                    (SubscriptionKind::Change, SubType::Observe | SubType::Subscribe) => {
                        sub.invoke_change(&ChangeSet::new(path, value_text.clone()));
                    }
                    (SubscriptionKind::Execute, SubType::Execute) => {
                        let opaque = value_text.as_deref().and_then(|t| {
                            lwm2m_codec::value_codec::decode_scalar(lwm2m_types::ResourceKind::Opaque, t).ok()
                        });
                        let bytes = opaque.and_then(|v| match v {
                            lwm2m_types::ResourceValue::Opaque(Opaque(bytes)) => Some(bytes),
                            _ => None,
                        });
                        sub.invoke_execute(&ExecuteArguments::new(bytes));
                    }
                    _ => {}
                }
            }
        }
    }
}
