//! Thin listening helper that hands each accepted socket to a factory.
//!
//! An `Acceptor` never reconnects — that is a `Connector`-only concept —
//! and it never applies framing; it is purely "listen, accept, configure,
//! hand off".

use crate::endpoint::EndpointCfg;
use crate::socket_options::SocketOptionsCfg;

use compio::net::{TcpListener, TcpStream};
use std::io;
use tracing::{debug, warn};

/// Listens on one bound endpoint and repeatedly hands accepted sockets to
/// `on_accept`.
pub struct Acceptor {
    listener: TcpListener,
    options: SocketOptionsCfg,
}

impl Acceptor {
    /// Bind and start listening.
    pub async fn bind(endpoint: &EndpointCfg, options: SocketOptionsCfg) -> io::Result<Self> {
        let addr = endpoint.resolve()?;
        let listener = TcpListener::bind(addr).await?;
        debug!(%addr, "listening");
        Ok(Self { listener, options })
    }

    /// The concrete address bound to, useful when `endpoint.port == 0`.
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept one connection, applying the configured socket options.
    pub async fn accept(&self) -> io::Result<(TcpStream, std::net::SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        if !self.options.is_empty() {
            if let Err(e) = crate::tcp::apply_socket_options(&stream, &self.options) {
                warn!(error = %e, "failed to apply socket options to accepted connection");
            }
        }
        Ok((stream, addr))
    }

    /// Accept connections forever, invoking `on_accept` for each until it
    /// returns `false` or accept itself errors.
    pub async fn serve<F>(&self, mut on_accept: F) -> io::Result<()>
    where
        F: FnMut(TcpStream, std::net::SocketAddr) -> bool,
    {
        loop {
            let (stream, addr) = self.accept().await?;
            if !on_accept(stream, addr) {
                return Ok(());
            }
        }
    }
}
