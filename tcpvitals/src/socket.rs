//! Transport handle seam: read-only access to the OS-level descriptor of an
//! externally owned connection.

#[cfg(unix)]
pub use std::os::unix::io::RawFd;

/// Descriptor type on targets without Unix file descriptors. The fallback
/// reader on those targets never dereferences it.
#[cfg(not(unix))]
pub type RawFd = std::os::raw::c_int;

/// Read-only access to a transport's underlying socket descriptor.
///
/// Returns `None` when the transport is closed or otherwise no longer backed
/// by a live descriptor; the diagnostics layer treats that as an invalid
/// handle and fails without touching the platform. Implementors must not
/// transfer ownership of the descriptor; callers only query it.
pub trait TransportFd {
    fn transport_fd(&self) -> Option<RawFd>;
}

#[cfg(unix)]
impl TransportFd for std::net::TcpStream {
    fn transport_fd(&self) -> Option<RawFd> {
        use std::os::unix::io::AsRawFd;
        Some(self.as_raw_fd())
    }
}

// Windows sockets are not file descriptors; the fallback reader rejects the
// target before it ever consults the handle.
#[cfg(not(unix))]
impl TransportFd for std::net::TcpStream {
    fn transport_fd(&self) -> Option<RawFd> {
        None
    }
}

#[cfg(unix)]
impl TransportFd for std::os::unix::io::BorrowedFd<'_> {
    fn transport_fd(&self) -> Option<RawFd> {
        use std::os::unix::io::AsRawFd;
        Some(self.as_raw_fd())
    }
}

impl<T: TransportFd + ?Sized> TransportFd for &T {
    fn transport_fd(&self) -> Option<RawFd> {
        (**self).transport_fd()
    }
}
