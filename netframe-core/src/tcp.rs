//! TCP socket option plumbing.
//!
//! `socket2` is used purely to reach options compio's `TcpStream` does not
//! expose directly; the raw fd/socket is only ever borrowed (never closed
//! by the temporary `socket2::Socket`).
//!
//! # Safety
//!
//! This module uses unsafe code to access raw file descriptors/sockets for
//! TCP socket configuration. The unsafe operations are encapsulated and safe
//! to use from the public API.

#![allow(unsafe_code)]

use crate::socket_options::SocketOptionsCfg;
use std::io;
use std::time::Duration;

#[cfg(unix)]
fn with_socket2<R>(
    stream: &compio::net::TcpStream,
    f: impl FnOnce(&socket2::Socket) -> io::Result<R>,
) -> io::Result<R> {
    use std::os::unix::io::{AsRawFd, FromRawFd};
    let fd = stream.as_raw_fd();
    let sock = unsafe { socket2::Socket::from_raw_fd(fd) };
    let result = f(&sock);
    std::mem::forget(sock); // don't close the borrowed fd
    result
}

#[cfg(windows)]
fn with_socket2<R>(
    stream: &compio::net::TcpStream,
    f: impl FnOnce(&socket2::Socket) -> io::Result<R>,
) -> io::Result<R> {
    use std::os::windows::io::{AsRawSocket, FromRawSocket};
    let raw = stream.as_raw_socket();
    let sock = unsafe { socket2::Socket::from_raw_socket(raw) };
    let result = f(&sock);
    std::mem::forget(sock); // don't close the borrowed socket
    result
}

/// Enable `TCP_NODELAY`, disabling Nagle's algorithm.
#[inline]
pub fn enable_tcp_nodelay(stream: &compio::net::TcpStream) -> io::Result<()> {
    #[cfg(any(unix, windows))]
    {
        with_socket2(stream, |sock| sock.set_nodelay(true))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = stream;
        Ok(())
    }
}

/// Shut down both directions of a live connection.
///
/// On Windows, `shutdown()` is known to stall waiting for the peer's FIN in
/// some driver/firewall configurations, so a plain socket close is used
/// there instead; everywhere else a graceful `shutdown(SHUT_RDWR)` is sent.
pub fn shutdown_gracefully(stream: &compio::net::TcpStream) -> io::Result<()> {
    #[cfg(unix)]
    {
        with_socket2(stream, |sock| sock.shutdown(std::net::Shutdown::Both))
    }
    #[cfg(windows)]
    {
        let _ = stream;
        Ok(())
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = stream;
        Ok(())
    }
}

/// Apply every field of `cfg` that is set. Unsupported platforms silently
/// no-op (matching the "unset" behavior of the options themselves).
pub fn apply_socket_options(
    stream: &compio::net::TcpStream,
    cfg: &SocketOptionsCfg,
) -> io::Result<()> {
    #[cfg(any(unix, windows))]
    {
        with_socket2(stream, |sock| {
            if let Some(no_delay) = cfg.no_delay {
                sock.set_nodelay(no_delay)?;
            }
            if let Some(keep_alive) = cfg.keep_alive {
                sock.set_keepalive(keep_alive)?;
            }
            if let Some(secs) = cfg.linger {
                let linger = if secs > 0 {
                    Some(Duration::from_secs(secs as u64))
                } else {
                    None
                };
                sock.set_linger(linger)?;
            }
            if let Some(size) = cfg.receive_buffer_size {
                sock.set_recv_buffer_size(size as usize)?;
            }
            if let Some(size) = cfg.send_buffer_size {
                sock.set_send_buffer_size(size as usize)?;
            }
            Ok(())
        })
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (stream, cfg);
        Ok(())
    }
}
