//! Outbound-connect helper that owns the optional reconnect back-off.
//!
//! Unlike `Acceptor`, a `Connector` carries `ReconnectState` when configured
//! for auto-reconnect: the caller drives reconnection by calling
//! [`Connector::connect`] again after a connection-level shutdown, and the
//! connector remembers how long to wait before the next attempt.

use crate::endpoint::EndpointCfg;
use crate::reconnect::{ReconnectCfg, ReconnectState};
use crate::socket_options::SocketOptionsCfg;

use compio::net::TcpStream;
use std::io;
use tracing::{debug, warn};

/// Outbound TCP connect helper, optionally backed by exponential-backoff
/// reconnect state.
pub struct Connector {
    endpoint: EndpointCfg,
    options: SocketOptionsCfg,
    reconnect: Option<ReconnectState>,
}

impl Connector {
    #[must_use]
    pub fn new(endpoint: EndpointCfg, options: SocketOptionsCfg) -> Self {
        Self {
            endpoint,
            options,
            reconnect: None,
        }
    }

    /// Enable auto-reconnect with the given back-off configuration.
    #[must_use]
    pub fn with_auto_reconnect(mut self, cfg: ReconnectCfg) -> Self {
        self.reconnect = Some(ReconnectState::new(cfg));
        self
    }

    #[must_use]
    pub fn auto_reconnect_enabled(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Connect once, applying configured socket options. Does not consult
    /// the back-off timer — call [`Connector::wait_before_reconnect`]
    /// first if this is a retry.
    pub async fn connect(&self) -> io::Result<TcpStream> {
        let addr = self.endpoint.resolve()?;
        let stream = TcpStream::connect(addr).await?;
        if !self.options.is_empty() {
            if let Err(e) = crate::tcp::apply_socket_options(&stream, &self.options) {
                warn!(error = %e, "failed to apply socket options to outbound connection");
            }
        }
        debug!(%addr, "connected");
        Ok(stream)
    }

    /// Sleep for the next back-off interval, if auto-reconnect is enabled.
    /// A no-op when it isn't.
    pub async fn wait_before_reconnect(&mut self) {
        if let Some(reconnect) = &mut self.reconnect {
            let delay = reconnect.next_delay();
            debug!(?delay, attempt = reconnect.attempt(), "waiting before reconnect");
            compio::time::sleep(delay).await;
        }
    }

    /// Reset the back-off counter after a successful, durable connection.
    pub fn reconnect_succeeded(&mut self) {
        if let Some(reconnect) = &mut self.reconnect {
            reconnect.reset();
        }
    }

    /// Connect, retrying with back-off until `should_keep_trying` returns
    /// `false` or auto-reconnect isn't enabled (in which case a single
    /// attempt is made).
    pub async fn connect_with_retry(
        &mut self,
        mut should_keep_trying: impl FnMut(&io::Error) -> bool,
    ) -> io::Result<TcpStream> {
        loop {
            match self.connect().await {
                Ok(stream) => {
                    self.reconnect_succeeded();
                    return Ok(stream);
                }
                Err(e) => {
                    if self.reconnect.is_none() || !should_keep_trying(&e) {
                        return Err(e);
                    }
                    self.wait_before_reconnect().await;
                }
            }
        }
    }
}
