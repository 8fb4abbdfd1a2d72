//! netframe-core
//!
//! The framing-agnostic half of the transport: allocation, buffers,
//! endpoints, socket options, reconnect back-off, the connection engine,
//! and the acceptor/connector helpers that hand it a socket.
//!
//! - Pinned / io_uring-safe allocation (`alloc`)
//! - The buffer model (`buffer`)
//! - Endpoint resolution quirks (`endpoint`)
//! - TCP socket option plumbing (`tcp`, `socket_options`)
//! - Exponential-backoff reconnect state (`reconnect`)
//! - The per-connection state machine (`connection`)
//! - Listening / outbound-connect helpers (`acceptor`, `connector`)
//! - Pluggable stats and locking-policy seams (`stats`, `locking`)
//! - Error taxonomies (`error`)

#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::needless_pass_by_ref_mut)]
#![allow(clippy::match_same_arms)]

pub mod acceptor;
pub mod alloc;
pub mod buffer;
pub mod connection;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod locking;
pub mod reconnect;
pub mod socket_options;
pub mod stats;
pub mod tcp;
pub mod watchdog;

pub mod prelude {
    pub use crate::acceptor::Acceptor;
    pub use crate::alloc::{IoArena, IoBytes, SlabMut};
    pub use crate::buffer::{HeterogeneousBuffer, SimpleBuffer};
    pub use crate::connection::{
        Connection, ConnectionCfg, ConnectionId, InputContext, InputHandler, SendCallback,
        ShutdownHandler,
    };
    pub use crate::connector::Connector;
    pub use crate::endpoint::{AddrFamily, EndpointCfg};
    pub use crate::error::{SendOutcome, ShutdownReason, UpdateSocketOptionsResult};
    pub use crate::locking::{LockingPolicy, MutexLocking, NoopLocking};
    pub use crate::reconnect::{ReconnectCfg, ReconnectState};
    pub use crate::socket_options::SocketOptionsCfg;
    pub use crate::stats::{AtomicStats, Direction, NoOpStats, StatsDriver};
    pub use crate::watchdog::Watchdog;
}
