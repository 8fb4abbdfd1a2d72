//! Error taxonomies for the connection engine.
//!
//! Two levels exist: the connection-level reasons surfaced to a shutdown
//! handler, and the per-write outcome delivered to send-completion
//! callbacks. Neither crosses a strand boundary as a thrown exception —
//! both are plain values.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Reason a connection shut down, delivered to the shutdown handler exactly once.
#[derive(Debug, Clone, Error)]
pub enum ShutdownReason {
    #[error("shutdown requested by caller")]
    UserInitiated,
    #[error("io error: {0}")]
    IoError(Arc<io::Error>),
    #[error("peer closed the connection")]
    Eof,
    #[error("write watchdog fired before completion")]
    WriteTimeout,
    #[error("read timestamps are not supported by this transport")]
    ReadTsNotSupported,
}

impl ShutdownReason {
    pub fn io(err: io::Error) -> Self {
        Self::IoError(Arc::new(err))
    }
}

/// Outcome delivered to a send-completion callback.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The OS accepted every byte of the sequence.
    Success,
    /// The sequence failed mid-send.
    IoError(Arc<io::Error>),
    /// Never attempted because the connection had already failed.
    DidntSend,
    /// The connection was already refusing writes when `schedule_send` was called.
    RejectedScheduleSend,
}

/// Result of applying a `SocketOptionsCfg` to a live socket.
#[derive(Debug)]
pub enum UpdateSocketOptionsResult {
    Success,
    SocketClosed,
    Error(io::Error),
}

pub type Result<T> = std::result::Result<T, ShutdownReason>;
