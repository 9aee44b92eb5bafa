//! Static (in-process, embedded) LwM2M client engine (spec §4.F).
//!
//! Where `lwm2m-client` drives a session against an out-of-process daemon
//! over IPC, this crate *is* the client: object/resource storage lives in
//! application memory (raw pointers, pointer arrays, or callbacks) and a
//! cooperative [`client::StaticClient::process`] tick stands in for the
//! daemon's own event loop. The actual CoAP/DTLS transport is out of scope
//! (§1) — [`transport::StaticTransport`] is the seam a real binding plugs
//! into.

pub mod client;
pub mod config;
pub mod handler;
pub mod storage;
pub mod transport;

pub use client::StaticClient;
pub use config::{FactoryBootstrapInfo, SecurityInfo, SecurityMode, ServerInfo};
pub use handler::{HandlerOperation, HandlerRequest, HandlerResponse, LwM2MResult, ResourceHandler};
pub use storage::{decode_native, encode_native, PointerArrayBinding, PointerBinding, ResourceStorage};
pub use transport::{IncomingRequest, NullTransport, StaticTransport};
