//! Endpoint configuration and host-resolution quirks.
//!
//! Callers hand in an `EndpointCfg`; no JSON/config-file parsing happens
//! here (that is an out-of-scope collaborator) — this is a plain,
//! builder-style Rust struct.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// Address family to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddrFamily {
    #[default]
    V4,
    V6,
}

impl AddrFamily {
    #[must_use]
    pub const fn matches(self, addr: &SocketAddr) -> bool {
        matches!(
            (self, addr),
            (Self::V4, SocketAddr::V4(_)) | (Self::V6, SocketAddr::V6(_))
        )
    }
}

/// A TCP endpoint: host, port, and address family.
///
/// `host = ""`, `"127.0.0.1"`, and `"0.0.0.0"` all resolve through
/// [`EndpointCfg::real_host`] to the machine's host name, matching the
/// quirk of the endpoint this library's framing was distilled from.
/// `"localhost"` maps directly to `127.0.0.1` (or `::1` for `V6`).
#[derive(Debug, Clone)]
pub struct EndpointCfg {
    pub host: String,
    pub port: u16,
    pub protocol: AddrFamily,
}

impl EndpointCfg {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: AddrFamily::V4,
        }
    }

    #[must_use]
    pub const fn with_protocol(mut self, protocol: AddrFamily) -> Self {
        self.protocol = protocol;
        self
    }

    /// Apply the `host=""/"127.0.0.1"/"0.0.0.0"` → hostname and
    /// `"localhost"` → loopback quirks.
    #[must_use]
    pub fn real_host(&self) -> String {
        match self.host.as_str() {
            "" | "127.0.0.1" | "0.0.0.0" => Self::host_name(),
            "localhost" => match self.protocol {
                AddrFamily::V4 => "127.0.0.1".to_string(),
                AddrFamily::V6 => "::1".to_string(),
            },
            other => other.to_string(),
        }
    }

    /// Best-effort local host name, falling back to `"localhost"`.
    #[must_use]
    pub fn host_name() -> String {
        std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
    }

    /// Resolve to a concrete `SocketAddr`, honoring the address family.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        let host = self.real_host();

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        (host.as_str(), self.port)
            .to_socket_addrs()?
            .find(|a| self.protocol.matches(a))
            .or_else(|| (host.as_str(), self.port).to_socket_addrs().ok()?.next())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("could not resolve {host}:{}", self.port),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_v4_maps_to_loopback() {
        let cfg = EndpointCfg::new("localhost", 5555);
        assert_eq!(cfg.real_host(), "127.0.0.1");
    }

    #[test]
    fn localhost_v6_maps_to_loopback() {
        let cfg = EndpointCfg::new("localhost", 5555).with_protocol(AddrFamily::V6);
        assert_eq!(cfg.real_host(), "::1");
    }

    #[test]
    fn empty_and_wildcard_hosts_resolve_to_host_name() {
        let expected = EndpointCfg::host_name();
        assert_eq!(EndpointCfg::new("", 1).real_host(), expected);
        assert_eq!(EndpointCfg::new("127.0.0.1", 1).real_host(), expected);
        assert_eq!(EndpointCfg::new("0.0.0.0", 1).real_host(), expected);
    }

    #[test]
    fn explicit_ip_resolves_directly() {
        let cfg = EndpointCfg::new("203.0.113.5", 80);
        assert_eq!(cfg.resolve().unwrap(), "203.0.113.5:80".parse().unwrap());
    }
}
