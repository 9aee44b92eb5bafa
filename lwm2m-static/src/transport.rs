//! The CoAP/DTLS transport boundary (spec §1 "the transport is out of
//! scope; only its interface matters").
//!
//! `process()` needs something to poll for incoming LWM2M requests and
//! something to push notifications/responses back out, but actually
//! speaking CoAP over UDP/DTLS is explicitly not this crate's job. A real
//! binding implements [`StaticTransport`] against a CoAP library; this
//! crate ships only [`NullTransport`], which never has anything to
//! deliver, so a [`crate::client::StaticClient`] built from scratch is
//! still usable (and its `process()` loop testable) without a network
//! stack in the loop at all.

use lwm2m_types::{InstanceId, ObjectId, ResourceId};

use crate::handler::HandlerOperation;

/// A single request delivered by the transport, destined for dispatch
/// through [`crate::client::StaticClient::dispatch_request`]. Reuses
/// [`HandlerOperation`] as its operation-kind field since the shape is
/// identical to what a handler is invoked with.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub operation: HandlerOperation,
    pub object_id: ObjectId,
    pub instance_id: InstanceId,
    pub resource_id: Option<ResourceId>,
    pub payload: Vec<u8>,
}

/// The collaborator a [`crate::client::StaticClient`] polls each
/// `process()` tick. Implementations own the actual socket/DTLS session;
/// this crate only calls `poll()` and `send_response()`.
pub trait StaticTransport: Send {
    /// Returns the next request ready for dispatch, if any, without
    /// blocking.
    fn poll(&mut self) -> Option<IncomingRequest>;

    /// Sends an encoded response/notification payload back out. The
    /// static client does not inspect the transport's own wire format; it
    /// only hands over bytes already produced by the dispatch path.
    fn send_response(&mut self, payload: &[u8]);

    /// Milliseconds until this transport next wants `poll()` called again
    /// (e.g. a retransmission timer), or `None` if it has no opinion.
    fn next_call_ms(&self) -> Option<u64> {
        None
    }
}

/// A transport with nothing to deliver and nowhere to send — the default
/// for a [`crate::client::StaticClient`] that hasn't been wired to a real
/// CoAP stack yet.
#[derive(Debug, Default)]
pub struct NullTransport;

impl StaticTransport for NullTransport {
    fn poll(&mut self) -> Option<IncomingRequest> {
        None
    }

    fn send_response(&mut self, _payload: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_transport_never_yields_a_request() {
        let mut transport = NullTransport;
        assert!(transport.poll().is_none());
        assert_eq!(transport.next_call_ms(), None);
    }
}
