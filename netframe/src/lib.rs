//! # netframe
//!
//! A framing-aware async TCP transport built on `compio`.
//!
//! ## Architecture
//!
//! netframe is structured in two layers:
//!
//! - **`netframe-core`**: the framing-agnostic connection engine —
//!   acceptor/connector, back-pressure-aware writes, idle/write-timeout
//!   watchdogs, the zero-copy buffer model, stats and locking traits.
//! - **`netframe-proto`**: the package-stream protocol entry layered on
//!   top — the fixed 16-byte header, the input-stream ring, a type-tag
//!   dispatch registry, the heartbeat liveness state machine, and an
//!   optional per-stream back-pressure extension.
//! - **`netframe`**: this crate, a thin public facade over both.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netframe::prelude::*;
//! use netframe_core::endpoint::EndpointCfg;
//! use netframe_core::socket_options::SocketOptionsCfg;
//! use netframe_core::stats::NoOpStats;
//! use std::sync::Arc;
//!
//! struct EchoConsumer;
//! impl MessageConsumer for EchoConsumer {
//!     fn on_message(&mut self, carrier: MessageCarrier, entry: &Entry) {
//!         if let Ok(msg) = carrier.downcast::<netframe::demo_message::DemoMessage>() {
//!             entry.send(&msg);
//!         }
//!     }
//! }
//! struct LogShutdown;
//! impl EntryShutdownHandler for LogShutdown {
//!     fn on_shutdown(&mut self, _reason: EntryShutdownReason) {}
//! }
//!
//! # async fn example() {
//! let endpoint = EndpointCfg::new("127.0.0.1", 7878);
//! let acceptor = Acceptor::bind(&endpoint, SocketOptionsCfg::default()).await.unwrap();
//! let (stream, addr) = acceptor.accept().await.unwrap();
//!
//! let mut dispatch = Dispatch::new();
//! dispatch.register(netframe::demo_message::decoder());
//!
//! let entry = Entry::new(
//!     stream,
//!     Some(addr.to_string()),
//!     EntryCfg::default(),
//!     dispatch,
//!     Arc::new(NoOpStats),
//!     Box::new(EchoConsumer),
//!     Box::new(LogShutdown),
//! );
//! # drop(entry);
//! # }
//! ```
//!
//! ## Performance
//!
//! - **Zero-copy**: `bytes::Bytes` for refcounted buffers and attached
//!   binary payloads
//! - **`io_uring`/IOCP**: completion-based async I/O (via `compio`)
//! - **Adaptive read sizing**: the entry's read buffer grows and shrinks
//!   with observed traffic instead of a fixed allocation per read
//!
//! ## Safety
//!
//! - `#![deny(unsafe_code)]` holds for every crate in this workspace

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub use bytes::Bytes;
pub use netframe_core;
pub use netframe_proto;

/// A minimal demo message used by the bundled examples and benchmark.
pub mod demo_message;

/// Development helpers (benches/examples).
pub mod dev_tracing;

/// Re-exports of the types most callers need, from both `netframe-core`
/// and `netframe-proto`.
pub mod prelude {
    pub use netframe_core::prelude::*;
    pub use netframe_proto::prelude::*;
}
