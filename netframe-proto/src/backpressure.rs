//! Per-stream "latest-value-wins" back-pressure (§4.7, optional).
//!
//! Each caller-chosen `tag` gets its own slot holding at most one pending
//! buffer plus `in_flight_count`/`dropped_count`. Independent tags never
//! block each other — each keeps its own slot — though they share the
//! underlying connection's write queue fairly.

use crate::entry::Entry;
use crate::message::Message;

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

type PendingJob = Box<dyn FnOnce(&Arc<BackPressure>, &Entry) + Send>;

#[derive(Default)]
struct StreamSlot {
    in_flight_count: u32,
    dropped_count: u64,
    pending: Option<PendingJob>,
}

/// Collapses bursts of per-stream updates so that at most one buffer per
/// tag is ever in flight; stale updates are replaced rather than queued.
#[derive(Default)]
pub struct BackPressure {
    streams: Mutex<HashMap<u64, StreamSlot>>,
}

impl BackPressure {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Schedule `msg` for `tag`. If nothing for this tag is in flight, it
    /// sends immediately; otherwise it replaces any already-memorized
    /// pending buffer for the tag and bumps `dropped_count`, logging a
    /// warning at the 1st, 10th, and every 128th drop.
    pub fn bp_send<M: Message>(self: &Arc<Self>, entry: &Entry, tag: u64, msg: M) {
        let mut streams = self.streams.lock();
        let slot = streams.entry(tag).or_default();
        if slot.in_flight_count == 0 {
            slot.in_flight_count = 1;
            drop(streams);
            self.send_now(entry, tag, msg);
        } else {
            if slot.pending.is_some() {
                slot.dropped_count += 1;
                let dropped = slot.dropped_count;
                if dropped == 1 || dropped == 10 || dropped % 128 == 0 {
                    warn!(tag, dropped, "back-pressure coalesced a pending send");
                }
            }
            slot.pending = Some(Box::new(move |bp: &Arc<BackPressure>, entry: &Entry| {
                bp.send_now(entry, tag, msg);
            }));
        }
    }

    #[must_use]
    pub fn in_flight_count(&self, tag: u64) -> u32 {
        self.streams.lock().get(&tag).map_or(0, |s| s.in_flight_count)
    }

    #[must_use]
    pub fn dropped_count(&self, tag: u64) -> u64 {
        self.streams.lock().get(&tag).map_or(0, |s| s.dropped_count)
    }

    fn send_now<M: Message>(self: &Arc<Self>, entry: &Entry, tag: u64, msg: M) {
        let bp = self.clone();
        let entry_for_cb = entry.clone();
        entry.send_with_cb(
            &msg,
            Some(Box::new(move |_outcome| {
                bp.on_sent(&entry_for_cb, tag);
            })),
        );
    }

    /// Issue a completion callback: dispatch the memorized buffer next, if
    /// any, else mark the tag idle.
    fn on_sent(self: &Arc<Self>, entry: &Entry, tag: u64) {
        let next = {
            let mut streams = self.streams.lock();
            let Some(slot) = streams.get_mut(&tag) else {
                return;
            };
            match slot.pending.take() {
                Some(job) => Some(job),
                None => {
                    slot.in_flight_count = 0;
                    None
                }
            }
        };
        if let Some(job) = next {
            job(self, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntryCfg;
    use crate::dispatch::Dispatch;
    use crate::entry::{EntryShutdownHandler, EntryShutdownReason, MessageConsumer};
    use crate::message::{FnDecoder, MessageCarrier};
    use bytes::BytesMut;
    use netframe_core::endpoint::EndpointCfg;
    use netframe_core::socket_options::SocketOptionsCfg;
    use netframe_core::stats::NoOpStats;
    use std::time::Duration;

    #[derive(Clone)]
    struct Tick {
        value: u32,
    }

    impl Message for Tick {
        const MSG_TYPE: u16 = 3;

        fn byte_size(&self) -> usize {
            4
        }

        fn serialize_to(&self, buf: &mut BytesMut) -> bool {
            buf.extend_from_slice(&self.value.to_le_bytes());
            true
        }
    }

    struct Sink;
    impl MessageConsumer for Sink {
        fn on_message(&mut self, _c: MessageCarrier, _e: &crate::entry::Entry) {}
    }
    struct NoopShutdown;
    impl EntryShutdownHandler for NoopShutdown {
        fn on_shutdown(&mut self, _reason: EntryShutdownReason) {}
    }

    #[test]
    fn bursts_coalesce_to_at_most_two_in_flight() {
        let rt = compio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let endpoint = EndpointCfg::new("127.0.0.1", 0);
            let acceptor = netframe_core::acceptor::Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                .await
                .unwrap();
            let addr = acceptor.local_addr().unwrap();

            let client_stream = compio::net::TcpStream::connect(addr).await.unwrap();
            let (server_stream, _) = acceptor.accept().await.unwrap();

            let mut dispatch = Dispatch::new();
            dispatch.register(Box::new(FnDecoder::new(Tick::MSG_TYPE, |_input, _size| {
                Some(())
            })));

            let entry = crate::entry::Entry::new(
                server_stream,
                None,
                EntryCfg::default(),
                dispatch,
                Arc::new(NoOpStats),
                Box::new(Sink),
                Box::new(NoopShutdown),
            );

            let bp = BackPressure::new();
            for i in 0..20u32 {
                bp.bp_send(&entry, 1, Tick { value: i });
            }

            // At most one buffer was in flight plus the most recent pending;
            // some updates along the way must have been coalesced away.
            assert!(bp.dropped_count(1) > 0);
            drop(client_stream);
        });
    }
}
