//! netframe-proto
//!
//! The package-stream protocol entry layered on top of `netframe-core`'s
//! framing-agnostic connection: the fixed 16-byte package header, the
//! input-stream ring feeding a length-delimited message decoder, a
//! type-tag dispatch registry, the heartbeat liveness state machine, and
//! the optional per-stream back-pressure extension.
//!
//! - Wire framing (`header`)
//! - The input-stream ring (`pkg_input`)
//! - Message (de)serialization contract (`message`)
//! - Type-tag dispatch registry (`dispatch`)
//! - The entry itself: parse loop, send path, heartbeat, shutdown (`entry`)
//! - Per-stream latest-value-wins back-pressure (`backpressure`)
//! - Entry/heartbeat tuning (`config`)

#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::needless_pass_by_ref_mut)]
#![allow(clippy::match_same_arms)]

pub mod backpressure;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod header;
pub mod message;
pub mod pkg_input;

pub mod prelude {
    pub use crate::backpressure::BackPressure;
    pub use crate::config::{EntryCfg, HeartbeatCfg};
    pub use crate::dispatch::Dispatch;
    pub use crate::entry::{Entry, EntryShutdownHandler, EntryShutdownReason, MessageConsumer};
    pub use crate::header::{PackageHeader, PkgContentType, HEADER_LEN};
    pub use crate::message::{FnDecoder, Message, MessageCarrier, MessageDecoder};
    pub use crate::pkg_input::PackageInput;
}
