//! A single blocking UDP socket used as the session's request/response/
//! notification channel (spec §4.C).
//!
//! LwM2M messages are small and fit in a single UDP datagram, so framing is
//! "one `sendto` == one message, one `recvfrom` == one message" — no
//! length-prefixing is needed the way a stream transport would require.

use lwm2m_types::{Error, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::debug;

use crate::endpoint::Endpoint;

/// Largest datagram this channel will read. LwM2M object trees are small;
/// this is generous headroom over the daemon's own frame cap.
const MAX_DATAGRAM: usize = 64 * 1024;

pub struct UdpChannel {
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
}

impl UdpChannel {
    pub fn new() -> Self {
        Self {
            socket: None,
            peer: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Opens the channel: binds an ephemeral local socket, associates the
    /// peer address, and confirms reachability with a zero-length probe
    /// datagram. `IPCError` if already connected; `Timeout` if the peer
    /// never answers the probe within `timeout`.
    pub fn connect(&mut self, endpoint: &Endpoint, timeout: Duration) -> Result<()> {
        if self.socket.is_some() {
            return Err(Error::IPCError("channel already connected".into()));
        }
        let peer = endpoint.resolve()?;
        let bind_addr: SocketAddr = if peer.is_ipv6() { "[::]:0".parse().unwrap() } else { "0.0.0.0:0".parse().unwrap() };
        let socket = UdpSocket::bind(bind_addr).map_err(|e| Error::IPCError(e.to_string()))?;
        socket.connect(peer).map_err(|e| Error::IPCError(e.to_string()))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| Error::IPCError(e.to_string()))?;
        socket
            .set_write_timeout(Some(timeout))
            .map_err(|e| Error::IPCError(e.to_string()))?;

        socket.send(&[]).map_err(|e| Error::IPCError(e.to_string()))?;
        let mut buf = [0u8; MAX_DATAGRAM];
        match socket.recv(&mut buf) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                debug!(peer = %peer, "probe datagram went unanswered");
                return Err(Error::Timeout);
            }
            Err(e) => return Err(Error::IPCError(e.to_string())),
        }

        debug!(peer = %peer, "connected IPC channel");
        self.socket = Some(socket);
        self.peer = Some(peer);
        Ok(())
    }

    /// `SessionNotConnected` if not connected; `IPCError` if the channel
    /// was never configured at all (no peer ever resolved).
    pub fn disconnect(&mut self) -> Result<()> {
        if self.peer.is_none() {
            return Err(Error::IPCError("no IPC endpoint configured".into()));
        }
        if self.socket.take().is_none() {
            return Err(Error::SessionNotConnected);
        }
        Ok(())
    }

    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::SessionNotConnected)?;
        socket.send(bytes).map_err(|e| Error::IPCError(e.to_string()))?;
        Ok(())
    }

    /// Blocks up to `timeout` for the next datagram. Returns `Error::Timeout`
    /// on expiry, matching `perform`'s timeout contract (§4.D, §8 property 9).
    pub fn recv_blocking(&self, timeout: Duration) -> Result<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(Error::SessionNotConnected)?;
        socket.set_read_timeout(Some(timeout)).map_err(|e| Error::IPCError(e.to_string()))?;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match socket.recv(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                debug!("recv_blocking timed out after {timeout:?}");
                Err(Error::Timeout)
            }
            Err(e) => Err(Error::IPCError(e.to_string())),
        }
    }

    /// Non-blocking poll for a single pending datagram, used by `process()`
    /// to drain whatever notifications are already queued on the socket
    /// without stalling the caller beyond the overall deadline it manages.
    pub fn try_recv(&self) -> Result<Option<Vec<u8>>> {
        let socket = self.socket.as_ref().ok_or(Error::SessionNotConnected)?;
        // `set_read_timeout` rejects a zero duration on some platforms; one
        // millisecond is close enough to non-blocking for a poll loop.
        socket
            .set_read_timeout(Some(Duration::from_millis(1)))
            .map_err(|e| Error::IPCError(e.to_string()))?;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match socket.recv(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(Error::IPCError(e.to_string())),
        }
    }
}

impl Default for UdpChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;
    use std::thread;

    fn fake_daemon() -> (StdUdpSocket, u16) {
        let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[test]
    fn connect_succeeds_when_peer_echoes_probe() {
        let (daemon, port) = fake_daemon();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 16];
            if let Ok((n, from)) = daemon.recv_from(&mut buf) {
                let _ = daemon.send_to(&buf[..n], from);
            }
        });
        let mut channel = UdpChannel::new();
        let endpoint = Endpoint::new("127.0.0.1", port);
        channel.connect(&endpoint, Duration::from_millis(500)).unwrap();
        assert!(channel.is_connected());
        handle.join().unwrap();
    }

    #[test]
    fn connect_times_out_when_nobody_answers() {
        // bind a socket but never read from it, so the probe goes unanswered.
        let (_daemon, port) = fake_daemon();
        let mut channel = UdpChannel::new();
        let endpoint = Endpoint::new("127.0.0.1", port);
        let err = channel.connect(&endpoint, Duration::from_millis(100)).unwrap_err();
        assert_eq!(err, Error::Timeout);
    }

    #[test]
    fn disconnect_without_connect_is_ipc_error() {
        let mut channel = UdpChannel::new();
        assert_eq!(channel.disconnect().unwrap_err(), Error::IPCError("no IPC endpoint configured".into()));
    }
}
