//! TCP socket option overrides applied at connect/accept time and via
//! `Connection::update_socket_options`.

use crate::error::UpdateSocketOptionsResult;
use compio::net::TcpStream;
use std::io;

/// Optional socket-level overrides. Unset fields are left at the OS default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptionsCfg {
    pub no_delay: Option<bool>,
    pub keep_alive: Option<bool>,
    /// `SO_LINGER` timeout in seconds.
    pub linger: Option<i32>,
    pub receive_buffer_size: Option<i32>,
    pub send_buffer_size: Option<i32>,
}

impl SocketOptionsCfg {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.no_delay.is_none()
            && self.keep_alive.is_none()
            && self.linger.is_none()
            && self.receive_buffer_size.is_none()
            && self.send_buffer_size.is_none()
    }

    /// Apply only the fields that are set. Returns `SocketClosed` if
    /// `stream` is `None`.
    pub fn apply(&self, stream: Option<&TcpStream>) -> UpdateSocketOptionsResult {
        let Some(stream) = stream else {
            return UpdateSocketOptionsResult::SocketClosed;
        };
        match crate::tcp::apply_socket_options(stream, self) {
            Ok(()) => UpdateSocketOptionsResult::Success,
            Err(e) => UpdateSocketOptionsResult::Error(e),
        }
    }
}

pub type Result<T> = io::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(SocketOptionsCfg::default().is_empty());
    }

    #[test]
    fn non_empty_once_a_field_is_set() {
        let cfg = SocketOptionsCfg {
            no_delay: Some(true),
            ..Default::default()
        };
        assert!(!cfg.is_empty());
    }
}
