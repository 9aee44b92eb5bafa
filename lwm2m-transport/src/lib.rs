//! Blocking UDP IPC channel to the LwM2M daemon (spec §4.C, §5).
//!
//! `std::net::UdpSocket` + `set_read_timeout`, not `tokio`: §5's
//! concurrency contract is single-threaded and blocking
//! (`perform`/`process`/`connect`/`disconnect` all block up to a timeout on
//! socket I/O), so an async runtime would misrepresent the contract rather
//! than implement it (§9 design note: adapt HOW to the spec's own model).

pub mod endpoint;
pub mod udp;

pub use endpoint::Endpoint;
pub use udp::UdpChannel;
