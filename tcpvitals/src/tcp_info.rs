//! Kernel TCP statistics retrieval.
//!
//! Wraps the platform's TCP-info mechanism (`getsockopt(TCP_INFO)` on
//! Linux-family kernels) behind a platform-independent entry point. The raw
//! fixed-layout kernel struct stays inside this module; only the handful of
//! fields the snapshot layer consumes cross the boundary, already converted
//! to portable types.

use std::fmt;

use crate::socket::TransportFd;

/// Error marker recorded when the build target has no TCP-info mechanism.
#[cfg(unix)]
pub const UNSUPPORTED_ERRNO: i32 = libc::EOPNOTSUPP;
/// Linux `EOPNOTSUPP`, used as a stable marker where the target has no
/// native errno space for it.
#[cfg(not(unix))]
pub const UNSUPPORTED_ERRNO: i32 = 95;

/// Error marker recorded when the transport has no live descriptor.
#[cfg(unix)]
pub const BAD_HANDLE_ERRNO: i32 = libc::EBADF;
/// Linux `EBADF`, same stand-in rationale as [`UNSUPPORTED_ERRNO`].
#[cfg(not(unix))]
pub const BAD_HANDLE_ERRNO: i32 = 9;

/// Errors from a single kernel stats retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpInfoError {
    /// The build target has no kernel TCP-info mechanism.
    Unsupported,
    /// The transport no longer has a live descriptor.
    InvalidHandle,
    /// The platform call failed; carries the errno the kernel reported.
    Syscall(i32),
}

impl TcpInfoError {
    /// Stable integer marker for this failure, suitable for recording in a
    /// snapshot's errno field.
    pub fn errno(&self) -> i32 {
        match self {
            TcpInfoError::Unsupported => UNSUPPORTED_ERRNO,
            TcpInfoError::InvalidHandle => BAD_HANDLE_ERRNO,
            TcpInfoError::Syscall(errno) => *errno,
        }
    }
}

impl fmt::Display for TcpInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpInfoError::Unsupported => write!(f, "TCP info is not supported on this platform"),
            TcpInfoError::InvalidHandle => write!(f, "transport has no live descriptor"),
            TcpInfoError::Syscall(errno) => write!(
                f,
                "getsockopt(TCP_INFO) failed: {}",
                std::io::Error::from_raw_os_error(*errno)
            ),
        }
    }
}

impl std::error::Error for TcpInfoError {}

/// Kernel TCP statistics consumed by the snapshot layer, extracted from the
/// platform's raw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawTcpStats {
    /// Smoothed round-trip time, microseconds.
    pub rtt_us: u32,
    /// Round-trip time variance, microseconds.
    pub rttvar_us: u32,
    /// Send congestion window, segments.
    pub cwnd: u32,
    /// Send maximum segment size, bytes.
    pub mss: u32,
    /// Segments retransmitted over the connection lifetime.
    pub total_retrans: u32,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod platform {
    use std::io;
    use std::mem;

    use super::{RawTcpStats, TcpInfoError};
    use crate::socket::RawFd;

    /// Kernel `struct tcp_info` layout up through `tcpi_total_retrans`, the
    /// newest field consumed here. The kernel copies at most the length we
    /// pass in, so fields added by newer kernels are simply not requested.
    #[repr(C)]
    #[derive(Debug, Default, Clone, Copy)]
    struct TcpInfo {
        tcpi_state: u8,
        tcpi_ca_state: u8,
        tcpi_retransmits: u8,
        tcpi_probes: u8,
        tcpi_backoff: u8,
        tcpi_options: u8,
        // snd_wscale:4 / rcv_wscale:4 bitfields
        tcpi_wscale: u8,
        // delivery_rate_app_limited:1 and later flag bits
        tcpi_flags: u8,
        tcpi_rto: u32,
        tcpi_ato: u32,
        tcpi_snd_mss: u32,
        tcpi_rcv_mss: u32,
        tcpi_unacked: u32,
        tcpi_sacked: u32,
        tcpi_lost: u32,
        tcpi_retrans: u32,
        tcpi_fackets: u32,
        tcpi_last_data_sent: u32,
        tcpi_last_ack_sent: u32,
        tcpi_last_data_recv: u32,
        tcpi_last_ack_recv: u32,
        tcpi_pmtu: u32,
        tcpi_rcv_ssthresh: u32,
        tcpi_rtt: u32,
        tcpi_rttvar: u32,
        tcpi_snd_ssthresh: u32,
        tcpi_snd_cwnd: u32,
        tcpi_advmss: u32,
        tcpi_reordering: u32,
        tcpi_rcv_rtt: u32,
        tcpi_rcv_space: u32,
        tcpi_total_retrans: u32,
    }

    pub(super) fn read(fd: RawFd) -> Result<RawTcpStats, TcpInfoError> {
        let mut info = TcpInfo::default();
        let mut len = mem::size_of::<TcpInfo>() as libc::socklen_t;

        let ret = unsafe {
            libc::getsockopt(
                fd,
                libc::IPPROTO_TCP,
                libc::TCP_INFO,
                &mut info as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        if ret < 0 {
            // errno must be read in this scope, before any other call can
            // clobber it
            let err = io::Error::last_os_error();
            log::debug!("getsockopt(TCP_INFO) failed: {}", err);
            return Err(TcpInfoError::Syscall(
                err.raw_os_error().unwrap_or(libc::EINVAL),
            ));
        }

        Ok(RawTcpStats {
            rtt_us: info.tcpi_rtt,
            rttvar_us: info.tcpi_rttvar,
            cwnd: info.tcpi_snd_cwnd,
            mss: info.tcpi_snd_mss,
            total_retrans: info.tcpi_total_retrans,
        })
    }
}

/// Retrieves the kernel's TCP statistics for `transport` in a single call.
///
/// Fails with [`TcpInfoError::InvalidHandle`] without touching the platform
/// when the transport has no live descriptor. Any kernel-reported failure
/// surfaces as [`TcpInfoError::Syscall`] carrying the errno.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn read_raw_stats<T: TransportFd + ?Sized>(transport: &T) -> Result<RawTcpStats, TcpInfoError> {
    let fd = transport
        .transport_fd()
        .ok_or(TcpInfoError::InvalidHandle)?;
    platform::read(fd)
}

/// Fallback for targets without a TCP-info mechanism: always fails with
/// [`TcpInfoError::Unsupported`], never attempting a platform call.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn read_raw_stats<T: TransportFd + ?Sized>(
    _transport: &T,
) -> Result<RawTcpStats, TcpInfoError> {
    Err(TcpInfoError::Unsupported)
}

/// Retrieves only the smoothed round-trip time, in microseconds.
///
/// Returns -1 on any failure, including an invalid handle. Each call is its
/// own kernel retrieval; callers that want more than the RTT should take a
/// full snapshot instead of calling this repeatedly.
pub fn read_rtt<T: TransportFd + ?Sized>(transport: &T) -> i64 {
    match read_raw_stats(transport) {
        Ok(raw) => i64::from(raw.rtt_us),
        Err(_) => -1,
    }
}
