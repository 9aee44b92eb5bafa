//! In-memory fake daemon standing in for the real out-of-process LWM2M
//! daemon, for the scenario tests under `tests/`.
//!
//! Driven the same way `src/session.rs`'s own
//! `reconnecting_already_connected_session_is_an_error` test drives one: a
//! plain `std::net::UdpSocket` on a background thread. The only daemon
//! behaviour that's fixed rather than caller-supplied is answering
//! `UdpChannel::connect`'s zero-length probe datagram, since every scenario
//! needs a connected session before it can do anything else.

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use lwm2m_codec::tree::{
    ContentTree, ObjectInstanceNode, ObjectNode, ObjectsTree, ResourceInstanceNode, ResourceNode,
    ResultNode,
};
use lwm2m_codec::wire::{Message, MessageType, ResponseCode, SubType};
use lwm2m_types::{Path, PathError};

const MAX_DATAGRAM: usize = 64 * 1024;

/// A fake daemon: answers the session's connect probe, then feeds every
/// parsed request to `respond` and sends back whatever messages it
/// returns, in order. `respond` is free to carry its own state (a created
/// instance, a pending notification) across calls since it's an `FnMut`.
pub struct FakeDaemon {
    port: u16,
}

impl FakeDaemon {
    pub fn spawn<F>(mut respond: F) -> Self
    where
        F: FnMut(Message) -> Vec<Message> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind fake daemon socket");
        let port = socket.local_addr().unwrap().port();
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set fake daemon read timeout");

        thread::spawn(move || {
            let mut buf = vec![0u8; MAX_DATAGRAM];

            let peer: SocketAddr = match socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let _ = socket.send_to(&buf[..n], from);
                    from
                }
                Err(_) => return,
            };

            loop {
                let n = match socket.recv_from(&mut buf) {
                    Ok((n, _)) => n,
                    Err(_) => return,
                };
                let Ok(text) = std::str::from_utf8(&buf[..n]) else { continue };
                let Ok(message) = Message::from_xml(text) else { continue };
                for reply in respond(message) {
                    if let Ok(xml) = reply.to_xml() {
                        let _ = socket.send_to(xml.as_bytes(), peer);
                    }
                }
            }
        });

        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// The first `(path, value_text)` carried by a message's content tree, if
/// any — every scenario here sends at most one leaf per request.
pub fn first_leaf(message: &Message) -> Option<(Path, Option<String>)> {
    match &message.content {
        ContentTree::Objects(tree) => tree.walk().into_iter().next().map(|(path, value, _)| (path, value)),
        ContentTree::Clients(_) => None,
    }
}

/// Builds a one-leaf response/notification tree, with a `Success` result
/// at whatever depth `path` names. `value_text` is the already wire-encoded
/// text (as produced by `lwm2m_codec::value_codec::encode_scalar`, or
/// forwarded straight through from a request's own leaf).
pub fn single_leaf_tree(path: Path, value_text: Option<String>) -> ObjectsTree {
    let success = Some(ResultNode { error: PathError::Success });

    let resource_instance = path.resource_instance.map(|ri| ResourceInstanceNode {
        id: ri.value(),
        value: value_text.clone(),
        result: success,
    });

    let resource = path.resource.map(|r| {
        let mut node = ResourceNode {
            id: r.value(),
            value: None,
            instances: Vec::new(),
            subscribe: None,
            result: None,
        };
        match resource_instance {
            Some(ri_node) => node.instances.push(ri_node),
            None => {
                node.value = value_text.clone();
                node.result = success;
            }
        }
        node
    });

    let instance = path.instance.map(|i| {
        let mut node = ObjectInstanceNode { id: i.value(), resources: Vec::new(), result: None };
        match resource {
            Some(r_node) => node.resources.push(r_node),
            None => node.result = success,
        }
        node
    });

    let mut object = ObjectNode { id: path.object.value(), instances: Vec::new(), result: None };
    match instance {
        Some(i_node) => object.instances.push(i_node),
        None => object.result = success,
    }

    ObjectsTree { objects: vec![object] }
}

/// A successful `Response` message for `sub_type`, carrying one leaf.
pub fn response(session_id: u32, sub_type: SubType, path: Path, value_text: Option<String>) -> Message {
    Message {
        message_type: MessageType::Response,
        sub_type,
        session_id,
        response_code: Some(ResponseCode::Success),
        content: ContentTree::Objects(single_leaf_tree(path, value_text)),
    }
}

/// An unsolicited `Notification` message, the shape the subscription
/// fan-out (`src/subscribe/dispatch.rs`) expects for both change and
/// execute notifications.
pub fn notification(session_id: u32, sub_type: SubType, path: Path, value_text: Option<String>) -> Message {
    Message {
        message_type: MessageType::Notification,
        sub_type,
        session_id,
        response_code: None,
        content: ContentTree::Objects(single_leaf_tree(path, value_text)),
    }
}
