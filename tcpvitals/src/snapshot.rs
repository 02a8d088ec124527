//! Point-in-time transport diagnostics snapshots.

use std::time::Duration;

use crate::socket::TransportFd;
use crate::tcp_info::{self, RawTcpStats};

/// Sentinel held by integer metrics the platform could not provide.
pub const UNAVAILABLE: i64 = -1;

/// Sentinel held by `rtx` when no estimate could be computed. Distinct from
/// `0.0`, which means zero retransmissions were observed.
pub const RTX_INDETERMINATE: f64 = -1.0;

/// One capture of the kernel's view of a TCP connection.
///
/// A capture always yields a structurally complete snapshot; `valid_tcpinfo`
/// and the per-field sentinels tell the caller how much of it to trust.
/// Every metric holds -1 when unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSnapshot {
    /// True iff the raw kernel stats were successfully retrieved.
    pub valid_tcpinfo: bool,
    /// Platform error code when retrieval failed; meaningful only while
    /// `valid_tcpinfo` is false.
    pub tcpinfo_errno: i32,
    /// Smoothed round-trip time in microseconds.
    pub rtt_us: i64,
    /// Round-trip time variance in microseconds.
    pub rttvar_us: i64,
    /// Send congestion window in segments.
    pub cwnd: i64,
    /// Maximum segment size in bytes.
    pub mss: i64,
    /// Estimated fraction of sent segments that were retransmitted. Zero
    /// when no retransmissions were observed, [`RTX_INDETERMINATE`] when no
    /// estimate could be made.
    pub rtx: f64,
    /// Bytes sent on the connection, as supplied by the caller. Stored
    /// untouched.
    pub total_bytes: u64,
}

impl Default for TransportSnapshot {
    fn default() -> Self {
        Self {
            valid_tcpinfo: false,
            tcpinfo_errno: 0,
            rtt_us: UNAVAILABLE,
            rttvar_us: UNAVAILABLE,
            cwnd: UNAVAILABLE,
            mss: UNAVAILABLE,
            rtx: RTX_INDETERMINATE,
            total_bytes: 0,
        }
    }
}

impl TransportSnapshot {
    /// Captures the kernel's current TCP statistics for `transport`.
    ///
    /// `total_bytes` is the caller-maintained count of bytes sent on the
    /// connection; it feeds the retransmission-ratio estimate. This never
    /// fails: an unsupported platform or a failed retrieval leaves
    /// `valid_tcpinfo` false with the error code in `tcpinfo_errno` and
    /// every metric at its sentinel.
    pub fn capture<T: TransportFd + ?Sized>(transport: &T, total_bytes: u64) -> Self {
        let mut snap = Self {
            total_bytes,
            ..Self::default()
        };
        match tcp_info::read_raw_stats(transport) {
            Ok(raw) => snap.fill(&raw),
            Err(err) => snap.tcpinfo_errno = err.errno(),
        }
        snap
    }

    fn fill(&mut self, raw: &RawTcpStats) {
        self.valid_tcpinfo = true;
        self.rtt_us = i64::from(raw.rtt_us);
        self.rttvar_us = i64::from(raw.rttvar_us);
        self.cwnd = i64::from(raw.cwnd);
        self.mss = i64::from(raw.mss);
        self.rtx = estimate_retransmit_ratio(raw.total_retrans, self.mss, self.total_bytes);
    }

    /// Smoothed round-trip time, or `None` if the capture had none.
    pub fn rtt(&self) -> Option<Duration> {
        (self.rtt_us >= 0).then(|| Duration::from_micros(self.rtt_us as u64))
    }

    /// Round-trip time variance, or `None` if the capture had none.
    pub fn rttvar(&self) -> Option<Duration> {
        (self.rttvar_us >= 0).then(|| Duration::from_micros(self.rttvar_us as u64))
    }

    /// Retransmission-ratio estimate, or `None` when indeterminate.
    pub fn retransmit_ratio(&self) -> Option<f64> {
        (self.rtx >= 0.0).then_some(self.rtx)
    }
}

/// Estimates the fraction of sent segments that were retransmitted.
///
/// The kernel reports how many segments were retransmitted but not how many
/// went out, so the outgoing count is approximated as `total_bytes / mss`.
/// Real segments are at most MSS bytes, which makes that an underestimate of
/// segments sent and the returned ratio an overestimate of the true
/// retransmission rate. Consumers should treat it as a pessimistic upper
/// bound, not a measurement.
///
/// Returns 0 when no retransmissions were observed, regardless of the other
/// inputs, and [`RTX_INDETERMINATE`] when retransmissions happened but `mss`
/// or `total_bytes` is non-positive.
pub fn estimate_retransmit_ratio(total_retrans: u32, mss: i64, total_bytes: u64) -> f64 {
    if total_retrans == 0 {
        return 0.0;
    }
    if mss > 0 && total_bytes > 0 {
        let segments_out = total_bytes as f64 / mss as f64;
        f64::from(total_retrans) / segments_out
    } else {
        RTX_INDETERMINATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::RawFd;

    struct ClosedTransport;

    impl TransportFd for ClosedTransport {
        fn transport_fd(&self) -> Option<RawFd> {
            None
        }
    }

    #[test]
    fn test_zero_retransmissions_is_exactly_zero() {
        assert_eq!(estimate_retransmit_ratio(0, 1460, 1_000_000), 0.0);
        assert_eq!(estimate_retransmit_ratio(0, 0, 0), 0.0);
    }

    #[test]
    fn test_ratio_from_bytes_and_mss() {
        // 146000 bytes / 1460 mss -> 100 estimated segments out
        let rtx = estimate_retransmit_ratio(5, 1460, 146_000);
        assert!((rtx - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_is_pessimistic_upper_bound() {
        // 150 real segments of ~973 bytes each, 6 retransmitted: the true
        // rate is 0.04 but the byte-derived segment count (100) inflates it.
        let true_rate = 6.0 / 150.0;
        let rtx = estimate_retransmit_ratio(6, 1460, 146_000);
        assert!(rtx >= true_rate);
    }

    #[test]
    fn test_indeterminate_without_mss_or_bytes() {
        assert_eq!(estimate_retransmit_ratio(5, 0, 146_000), RTX_INDETERMINATE);
        assert_eq!(estimate_retransmit_ratio(5, -1, 146_000), RTX_INDETERMINATE);
        assert_eq!(estimate_retransmit_ratio(5, 1460, 0), RTX_INDETERMINATE);
    }

    #[test]
    fn test_fill_from_raw_counters() {
        let raw = RawTcpStats {
            rtt_us: 350,
            rttvar_us: 40,
            cwnd: 10,
            mss: 1460,
            total_retrans: 5,
        };
        let mut snap = TransportSnapshot {
            total_bytes: 146_000,
            ..Default::default()
        };
        snap.fill(&raw);

        assert!(snap.valid_tcpinfo);
        assert_eq!(snap.rtt_us, 350);
        assert_eq!(snap.rttvar_us, 40);
        assert_eq!(snap.cwnd, 10);
        assert_eq!(snap.mss, 1460);
        assert!((snap.rtx - 0.05).abs() < 1e-12);
        assert_eq!(snap.rtt(), Some(Duration::from_micros(350)));
        assert_eq!(snap.retransmit_ratio(), Some(snap.rtx));
    }

    #[test]
    fn test_closed_transport_yields_sentinels() {
        let snap = TransportSnapshot::capture(&ClosedTransport, 42);

        assert!(!snap.valid_tcpinfo);
        assert_eq!(snap.rtt_us, UNAVAILABLE);
        assert_eq!(snap.rttvar_us, UNAVAILABLE);
        assert_eq!(snap.cwnd, UNAVAILABLE);
        assert_eq!(snap.mss, UNAVAILABLE);
        assert_eq!(snap.rtx, RTX_INDETERMINATE);
        assert_eq!(snap.total_bytes, 42);
        assert!(snap.rtt().is_none());
        assert!(snap.rttvar().is_none());
        assert!(snap.retransmit_ratio().is_none());

        #[cfg(any(target_os = "linux", target_os = "android"))]
        assert_eq!(snap.tcpinfo_errno, crate::tcp_info::BAD_HANDLE_ERRNO);
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        assert_eq!(snap.tcpinfo_errno, crate::tcp_info::UNSUPPORTED_ERRNO);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    mod live {
        use super::*;
        use std::io::Write;
        use std::net::{TcpListener, TcpStream};

        fn loopback_pair() -> (TcpStream, TcpStream) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
            let (server, _) = listener.accept().unwrap();
            (client, server)
        }

        #[test]
        fn test_capture_on_live_connection() {
            let (mut client, _server) = loopback_pair();
            client.write_all(&[0u8; 4096]).unwrap();

            let snap = TransportSnapshot::capture(&client, 4096);
            assert!(snap.valid_tcpinfo);
            assert_eq!(snap.tcpinfo_errno, 0);
            assert!(snap.rtt_us >= 0);
            assert!(snap.cwnd > 0);
            assert!(snap.mss > 0);
            // loopback traffic does not retransmit
            assert_eq!(snap.rtx, 0.0);
        }

        #[test]
        fn test_capture_is_stable_without_traffic() {
            let (mut client, _server) = loopback_pair();
            client.write_all(&[0u8; 1024]).unwrap();

            let first = TransportSnapshot::capture(&client, 1024);
            let second = TransportSnapshot::capture(&client, 1024);
            assert!(first.valid_tcpinfo && second.valid_tcpinfo);
            assert_eq!(first.rtx, second.rtx);
            assert_eq!(first.mss, second.mss);
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    #[test]
    fn test_unsupported_platform_reports_not_supported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();

        let snap = TransportSnapshot::capture(&client, 1024);
        assert!(!snap.valid_tcpinfo);
        assert_eq!(snap.tcpinfo_errno, crate::tcp_info::UNSUPPORTED_ERRNO);
        assert_eq!(snap.rtt_us, UNAVAILABLE);
        assert_eq!(snap.rttvar_us, UNAVAILABLE);
        assert_eq!(snap.cwnd, UNAVAILABLE);
        assert_eq!(snap.mss, UNAVAILABLE);
        assert_eq!(snap.rtx, RTX_INDETERMINATE);
    }
}
