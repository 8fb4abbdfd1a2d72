//! Protocol-entry configuration: package-size bound and heartbeat timing.
//!
//! Tuning these values trades liveness-detection latency against heartbeat
//! chatter: a short `initiate_timeout` notices a quiet peer sooner but
//! sends more probes during normal idle periods.

use netframe_core::connection::ConnectionCfg;
use std::time::Duration;

/// Hard upper bound on `content_size` accepted by the parse loop.
pub const DEFAULT_MAX_VALID_PACKAGE_SIZE: u32 = 100 * 1024 * 1024;

/// Ceiling the adaptive read-buffer doubling in §4.6.1 never exceeds.
pub const ADAPTIVE_READ_BUFFER_CEILING: usize = 32 * 1024 * 1024;

/// Time with no input before a heartbeat probe is emitted.
pub const DEFAULT_INITIATE_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time with no input, after a probe was sent, before the entry gives up
/// on the peer and shuts down.
pub const DEFAULT_AWAIT_HEARTBEAT_REPLY_TIMEOUT: Duration = Duration::from_secs(20);

/// Heartbeat timer thresholds.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatCfg {
    pub initiate_timeout: Duration,
    pub await_reply_timeout: Duration,
}

impl Default for HeartbeatCfg {
    fn default() -> Self {
        Self {
            initiate_timeout: DEFAULT_INITIATE_HEARTBEAT_TIMEOUT,
            await_reply_timeout: DEFAULT_AWAIT_HEARTBEAT_REPLY_TIMEOUT,
        }
    }
}

/// Entry-level configuration: the underlying connection's tuning plus the
/// protocol-specific bounds layered on top.
#[derive(Debug, Clone, Copy)]
pub struct EntryCfg {
    pub connection: ConnectionCfg,
    pub max_valid_package_size: u32,
    pub heartbeat: HeartbeatCfg,
}

impl Default for EntryCfg {
    fn default() -> Self {
        Self {
            connection: ConnectionCfg::default(),
            max_valid_package_size: DEFAULT_MAX_VALID_PACKAGE_SIZE,
            heartbeat: HeartbeatCfg::default(),
        }
    }
}
