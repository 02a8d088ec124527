//! # tcpvitals
//!
//! Kernel-level TCP transport diagnostics for established connections.
//!
//! tcpvitals takes a single point-in-time snapshot of the kernel's view of a
//! TCP connection (smoothed round-trip time, congestion window, and maximum
//! segment size) and derives an estimated retransmission ratio from the
//! kernel's retransmit counter plus a caller-maintained bytes-sent count.
//! It feeds connection-quality and observability layers; it does not manage
//! sockets, count bytes, or poll.
//!
//! ## Features
//!
//! - **Single-call snapshots**: one `getsockopt(TCP_INFO)` per capture, no
//!   polling, no caching, no retries
//! - **Graceful degradation**: unsupported platforms and failed retrievals
//!   yield sentinel values plus the platform errno, never a panic
//! - **Retransmission-ratio estimate** with a documented pessimistic bias
//! - **Pluggable transports** via the [`TransportFd`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::io::Write;
//! use std::net::TcpStream;
//! use tcpvitals::TransportSnapshot;
//!
//! let mut stream = TcpStream::connect("93.184.216.34:80").unwrap();
//! let payload = b"GET / HTTP/1.0\r\n\r\n";
//! stream.write_all(payload).unwrap();
//!
//! let snap = TransportSnapshot::capture(&stream, payload.len() as u64);
//! if snap.valid_tcpinfo {
//!     println!(
//!         "rtt={}us cwnd={} mss={} rtx={}",
//!         snap.rtt_us, snap.cwnd, snap.mss, snap.rtx
//!     );
//! }
//! ```

pub mod snapshot;
pub mod socket;
pub mod tcp_info;

pub use snapshot::{estimate_retransmit_ratio, TransportSnapshot, RTX_INDETERMINATE, UNAVAILABLE};
pub use socket::{RawFd, TransportFd};
pub use tcp_info::{read_raw_stats, read_rtt, RawTcpStats, TcpInfoError};
