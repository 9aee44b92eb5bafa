//! The (address, port) pair a session's IPC channel connects to.

use lwm2m_types::{Error, Result};
use std::net::{SocketAddr, ToSocketAddrs};

/// Default client IPC port, matching the daemon's well-known listen port
/// for the client API socket (spec §6 "Defaults").
pub const DEFAULT_CLIENT_PORT: u16 = 12345;
/// Default client IPC address: the daemon is expected to run on the same
/// host as the application linking this library.
pub const DEFAULT_CLIENT_ADDRESS: &str = "127.0.0.1";

/// A numeric (v4/v6) address or hostname, plus port. Resolution is
/// deferred to `connect()` time so `set_ipc_udp` can fail fast on a
/// syntactically-bad address without yet needing a resolver round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    pub fn default_client() -> Self {
        Self::new(DEFAULT_CLIENT_ADDRESS, DEFAULT_CLIENT_PORT)
    }

    /// Resolves to a concrete socket address, failing with `IPCError` if
    /// the address is neither a numeric literal nor a resolvable hostname.
    pub fn resolve(&self) -> Result<SocketAddr> {
        (self.address.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::IPCError(format!("unresolvable endpoint {}:{}: {e}", self.address, self.port)))?
            .next()
            .ok_or_else(|| Error::IPCError(format!("no addresses for {}:{}", self.address, self.port)))
    }
}
