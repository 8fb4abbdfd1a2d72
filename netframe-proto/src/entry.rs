//! The protocol entry: a framing-aware wrapper around a [`Connection`].
//!
//! `Entry` owns the [`PackageInput`] ring, the heartbeat timer, and the
//! message dispatch table; the underlying `Connection` is framing-agnostic
//! and only ever sees `InputContext`/`schedule_send`.
//!
//! Ownership mirrors the connection engine: `Entry` is reference-counted
//! because completion callbacks and the watchdog outlive a single call, but
//! the proxy handlers installed on the `Connection` hold only a *weak*
//! back-pointer to `EntryInner` — `EntryInner` itself owns the
//! `Connection` (a strong reference the other way), so a strong pair would
//! cycle and never drop.
//!
//! User callbacks (`on_message`, `on_shutdown`) may themselves call back
//! into `Entry::send`/`Entry::shutdown` from the same call stack. Since our
//! "strand" is literally the inner mutex, that reentrancy is handled by
//! temporarily taking `consumer`/`shutdown_handler` out of `EntryInner`
//! (via `Option::take`) before invoking them, so the lock is never held
//! across user code.

use crate::config::{EntryCfg, ADAPTIVE_READ_BUFFER_CEILING};
use crate::dispatch::Dispatch;
use crate::header::{PackageHeader, PkgContentType, HEADER_LEN};
use crate::message::{Message, MessageCarrier};
use crate::pkg_input::PackageInput;

use bytes::{Bytes, BytesMut};
use netframe_core::buffer::{HeterogeneousBuffer, SimpleBuffer};
use netframe_core::connection::{
    Connection, ConnectionId, InputContext, InputHandler, SendCallback, ShutdownHandler,
};
use netframe_core::error::ShutdownReason;
use netframe_core::locking::NoopLocking;
use netframe_core::stats::{Direction, StatsDriver};

use compio::net::TcpStream;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Entry-level shutdown taxonomy. Wraps the connection-level reasons and
/// adds protocol-specific causes; delivered to the shutdown handler at most
/// once.
#[derive(Debug, Clone)]
pub enum EntryShutdownReason {
    UnderlyingConnection(ShutdownReason),
    UserInitiated,
    ExceptionHandlingInput,
    InvalidInputPackage,
    UnexpectedInputPackageSize,
    InvalidInputPackageSize,
    InvalidHeartbeatPackage,
    UnknownPkgContentType,
    HeartbeatReplyTimeout,
}

impl fmt::Display for EntryShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderlyingConnection(r) => write!(f, "underlying connection: {r}"),
            Self::UserInitiated => write!(f, "shutdown requested by caller"),
            Self::ExceptionHandlingInput => write!(f, "panic/exception while handling input"),
            Self::InvalidInputPackage => write!(f, "message parse consumed fewer bytes than advertised"),
            Self::UnexpectedInputPackageSize => write!(f, "unexpected input package size"),
            Self::InvalidInputPackageSize => write!(f, "content_size exceeds max_valid_package_size"),
            Self::InvalidHeartbeatPackage => write!(f, "heartbeat package carried a non-zero body"),
            Self::UnknownPkgContentType => write!(f, "unrecognized pkg_content_type"),
            Self::HeartbeatReplyTimeout => write!(f, "peer stopped answering heartbeats"),
        }
    }
}

impl std::error::Error for EntryShutdownReason {}

/// Consumes fully-decoded messages.
pub trait MessageConsumer: Send {
    fn on_message(&mut self, carrier: MessageCarrier, entry: &Entry);
}

/// Notified exactly once when the entry shuts down.
pub trait EntryShutdownHandler: Send {
    fn on_shutdown(&mut self, reason: EntryShutdownReason);
}

struct EntryInner {
    cfg: EntryCfg,
    dispatch: Arc<Dispatch>,
    input: PackageInput,
    last_input_at: Instant,
    heartbeat_sent_count: u32,
    shutdown_fired: bool,
    consumer: Option<Box<dyn MessageConsumer>>,
    shutdown_handler: Option<Box<dyn EntryShutdownHandler>>,
    watchdog: netframe_core::watchdog::Watchdog,
    connection: Option<Connection<NoopLocking>>,
    stats: Arc<dyn StatsDriver>,
}

/// A framing-aware wrapper around one TCP connection: package header
/// parsing, message dispatch, and heartbeat liveness.
pub struct Entry {
    inner: Arc<Mutex<EntryInner>>,
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Entry {
    #[must_use]
    pub fn new(
        stream: TcpStream,
        remote: Option<String>,
        cfg: EntryCfg,
        dispatch: Dispatch,
        stats: Arc<dyn StatsDriver>,
        consumer: Box<dyn MessageConsumer>,
        shutdown_handler: Box<dyn EntryShutdownHandler>,
    ) -> Self {
        let connection_cfg = cfg.connection;
        let default_read_size = connection_cfg.input_buffer_size;

        let inner = Arc::new(Mutex::new(EntryInner {
            cfg,
            dispatch: Arc::new(dispatch),
            input: PackageInput::new(),
            last_input_at: Instant::now(),
            heartbeat_sent_count: 0,
            shutdown_fired: false,
            consumer: Some(consumer),
            shutdown_handler: Some(shutdown_handler),
            watchdog: netframe_core::watchdog::Watchdog::new(),
            connection: None,
            stats: stats.clone(),
        }));

        let input_handler = Box::new(EntryInputProxy {
            entry: Arc::downgrade(&inner),
            default_read_size,
            current_request: default_read_size,
        });
        let conn_shutdown_handler = Box::new(EntryConnShutdownProxy {
            entry: Arc::downgrade(&inner),
        });

        let connection = Connection::<NoopLocking>::new(
            stream,
            remote,
            connection_cfg,
            stats,
            input_handler,
            conn_shutdown_handler,
        );
        inner.lock().connection = Some(connection);

        let entry = Self { inner };
        entry.start();
        entry
    }

    fn start(&self) {
        let connection = self.connection();
        connection.start_reading();
        schedule_heartbeat_tick(&self.inner, self.inner.lock().cfg.heartbeat.initiate_timeout);
    }

    fn connection(&self) -> Connection<NoopLocking> {
        self.inner
            .lock()
            .connection
            .clone()
            .expect("connection installed before Entry is handed out")
    }

    fn stats(&self) -> Arc<dyn StatsDriver> {
        self.inner.lock().stats.clone()
    }

    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection().id()
    }

    #[must_use]
    pub fn remote_endpoint(&self) -> Option<String> {
        self.connection().remote_endpoint()
    }

    /// Serialize `msg`, frame it with a 16-byte header, and hand it to the
    /// connection's write queue.
    pub fn send<M: Message>(&self, msg: &M) {
        self.send_with_cb(msg, None);
    }

    /// As [`Entry::send`], but `cb` fires once the framed buffer's write
    /// sequence completes (see the connection's batch-wide callback
    /// contract).
    pub fn send_with_cb<M: Message>(&self, msg: &M, cb: Option<SendCallback>) {
        self.send_inner(msg, &[], cb);
    }

    /// As [`Entry::send`], with a sequence of attached binary buffers
    /// following the body. Each attached buffer is enqueued as its own
    /// `schedule_send` call, preserving wire order without copying.
    pub fn send_vec<M: Message>(&self, msg: &M, attached: Vec<Bytes>) {
        self.send_inner(msg, &attached, None);
    }

    fn send_inner<M: Message>(&self, msg: &M, attached: &[Bytes], cb: Option<SendCallback>) {
        let mut body = BytesMut::with_capacity(msg.byte_size());
        if !msg.serialize_to(&mut body) {
            warn!(msg_type = M::MSG_TYPE, "message serialize_to reported failure");
            if let Some(cb) = cb {
                cb(netframe_core::error::SendOutcome::DidntSend);
            }
            return;
        }
        let attached_binary_size: usize = attached.iter().map(Bytes::len).sum();
        let header = PackageHeader::message(M::MSG_TYPE, body.len() as u32, attached_binary_size as u32);

        let mut framed = BytesMut::with_capacity(HEADER_LEN + body.len());
        header.encode(&mut framed);
        framed.extend_from_slice(&body);

        self.stats()
            .record_message(M::MSG_TYPE, Direction::Tx, body.len() + attached_binary_size);

        let connection = self.connection();
        if attached.is_empty() {
            connection.schedule_send(
                HeterogeneousBuffer::Owned(SimpleBuffer::from_vec(framed.to_vec())),
                cb,
            );
        } else {
            connection.schedule_send(HeterogeneousBuffer::Owned(SimpleBuffer::from_vec(framed.to_vec())), None);
            let (last, rest) = attached.split_last().expect("non-empty checked above");
            for buf in rest {
                connection.schedule_send(HeterogeneousBuffer::Shared(buf.clone()), None);
            }
            connection.schedule_send(HeterogeneousBuffer::Shared(last.clone()), cb);
        }
    }

    /// Post `msg` to the entry's strand before serializing and sending it.
    /// Useful for callers on a foreign thread; since our strand is the
    /// inner mutex, this is a same-process task spawn rather than a true
    /// cross-thread post.
    pub fn post_send<M: Message>(&self, msg: M) {
        let entry = self.clone();
        compio::runtime::spawn(async move {
            entry.send(&msg);
        })
        .detach();
    }

    pub fn shutdown(&self, reason: EntryShutdownReason) {
        shutdown_entry(&self.inner, reason);
    }
}

/// Proxy `InputHandler` installed on the underlying `Connection`. Adapts
/// read-buffer sizing per §4.6.1: doubles the next request up to
/// `ADAPTIVE_READ_BUFFER_CEILING` when the previous read filled the
/// buffer it asked for, and resets to the configured default once a read
/// comes back smaller than that default.
struct EntryInputProxy {
    entry: Weak<Mutex<EntryInner>>,
    default_read_size: usize,
    current_request: usize,
}

impl InputHandler for EntryInputProxy {
    fn on_input(&mut self, mut ctx: InputContext<'_>) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };

        let filled = ctx.buf.len() >= self.current_request;
        let next_request = if filled {
            (self.current_request * 2).min(ADAPTIVE_READ_BUFFER_CEILING)
        } else if ctx.buf.len() < self.default_read_size {
            self.default_read_size
        } else {
            self.current_request
        };
        self.current_request = next_request;
        ctx.set_next_read_buffer_size(next_request);

        process_input(&entry, ctx.buf);
    }
}

/// Proxy `ShutdownHandler` installed on the underlying `Connection`;
/// forwards into the entry's own taxonomy.
struct EntryConnShutdownProxy {
    entry: Weak<Mutex<EntryInner>>,
}

impl ShutdownHandler for EntryConnShutdownProxy {
    fn on_shutdown(&mut self, reason: ShutdownReason) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        shutdown_entry(&entry, EntryShutdownReason::UnderlyingConnection(reason));
    }
}

fn process_input(entry: &Arc<Mutex<EntryInner>>, buf: Bytes) {
    {
        let mut guard = entry.lock();
        if guard.shutdown_fired {
            return;
        }
        guard.last_input_at = Instant::now();
        guard.heartbeat_sent_count = 0;
        guard.input.append(buf);
    }
    run_parse_loop(entry);
}

enum LoopAction {
    Done,
    Shutdown(EntryShutdownReason),
    Message(MessageCarrier),
    HeartbeatRequestReceived,
    HeartbeatReplyReceived,
}

fn run_parse_loop(entry: &Arc<Mutex<EntryInner>>) {
    loop {
        let action = step(entry);
        match action {
            LoopAction::Done => return,
            LoopAction::Shutdown(reason) => {
                shutdown_entry(entry, reason);
                return;
            }
            LoopAction::Message(carrier) => dispatch_message(entry, carrier),
            LoopAction::HeartbeatRequestReceived => send_heartbeat_reply(entry),
            LoopAction::HeartbeatReplyReceived => {
                trace!("heartbeat reply received");
            }
        }
    }
}

/// Run one iteration of the parse loop (§4.6.2) under the entry's lock.
fn step(entry: &Arc<Mutex<EntryInner>>) -> LoopAction {
    let mut guard = entry.lock();
    if guard.shutdown_fired {
        return LoopAction::Done;
    }
    if guard.input.total_size() < HEADER_LEN {
        return LoopAction::Done;
    }

    let header = guard.input.view_header();
    match header.content_type() {
        PkgContentType::Message => {
            if header.content_size > guard.cfg.max_valid_package_size {
                return LoopAction::Shutdown(EntryShutdownReason::InvalidInputPackageSize);
            }
            let frame_len = header.total_frame_len();
            if frame_len > guard.input.total_size() {
                return LoopAction::Done;
            }

            guard.input.skip(header.advertized_header_size());
            let total_before = guard.input.total_size();
            let dispatch = guard.dispatch.clone();
            let decoded = dispatch
                .get(header.content_specific_value)
                .and_then(|decoder| decoder.decode(&mut guard.input, header.content_size));

            let Some(message) = decoded else {
                return LoopAction::Shutdown(EntryShutdownReason::InvalidInputPackage);
            };
            let consumed = total_before - guard.input.total_size();
            if consumed < header.content_size as usize {
                return LoopAction::Shutdown(EntryShutdownReason::InvalidInputPackage);
            }

            let attached = if header.attached_binary_size > 0 {
                let mut buf = vec![0u8; header.attached_binary_size as usize];
                guard.input.read_buffer(&mut buf, buf.len());
                Some(Bytes::from(buf))
            } else {
                None
            };
            guard.stats.record_message(
                header.content_specific_value,
                Direction::Rx,
                header.content_size as usize + header.attached_binary_size as usize,
            );
            LoopAction::Message(MessageCarrier::new(header.content_specific_value, message, attached))
        }
        PkgContentType::HeartbeatRequest | PkgContentType::HeartbeatReply => {
            if header.content_size != 0 || header.attached_binary_size != 0 {
                return LoopAction::Shutdown(EntryShutdownReason::InvalidHeartbeatPackage);
            }
            let frame_len = header.advertized_header_size();
            if frame_len > guard.input.total_size() {
                return LoopAction::Done;
            }
            guard.input.skip(frame_len);
            if matches!(header.content_type(), PkgContentType::HeartbeatRequest) {
                LoopAction::HeartbeatRequestReceived
            } else {
                guard.heartbeat_sent_count = 0;
                LoopAction::HeartbeatReplyReceived
            }
        }
        PkgContentType::Unknown(_) => LoopAction::Shutdown(EntryShutdownReason::UnknownPkgContentType),
    }
}

fn dispatch_message(entry: &Arc<Mutex<EntryInner>>, carrier: MessageCarrier) {
    let consumer = {
        let mut guard = entry.lock();
        guard.consumer.take()
    };
    let Some(mut consumer) = consumer else {
        return;
    };
    let entry_handle = Entry { inner: entry.clone() };
    consumer.on_message(carrier, &entry_handle);
    entry.lock().consumer = Some(consumer);
}

fn send_heartbeat_reply(entry: &Arc<Mutex<EntryInner>>) {
    let connection = entry.lock().connection.clone();
    let Some(connection) = connection else {
        return;
    };
    let frame = PackageHeader::heartbeat_reply().encode_with_padding();
    connection.schedule_send(
        HeterogeneousBuffer::Owned(SimpleBuffer::from_vec(frame.to_vec())),
        None,
    );
}

fn send_heartbeat_request(connection: &Connection<NoopLocking>) {
    let frame = PackageHeader::heartbeat_request().encode_with_padding();
    connection.schedule_send(
        HeterogeneousBuffer::Owned(SimpleBuffer::from_vec(frame.to_vec())),
        None,
    );
}

fn schedule_heartbeat_tick(entry: &Arc<Mutex<EntryInner>>, delay: Duration) {
    let weak = Arc::downgrade(entry);
    let mut guard = entry.lock();
    guard.watchdog.start_watch(delay, move |_key| {
        if let Some(entry) = weak.upgrade() {
            heartbeat_tick(&entry);
        }
    });
}

/// One tick of the heartbeat state machine (§4.6.4): Idle / probe-pending /
/// dead, with the timer always rescheduled forward by at least
/// `initiate_timeout`, clamped to the remaining time until `await_reply_timeout`.
fn heartbeat_tick(entry: &Arc<Mutex<EntryInner>>) {
    let (since_last_input, initiate_timeout, await_reply_timeout, sent_count) = {
        let guard = entry.lock();
        if guard.shutdown_fired {
            return;
        }
        (
            guard.last_input_at.elapsed(),
            guard.cfg.heartbeat.initiate_timeout,
            guard.cfg.heartbeat.await_reply_timeout,
            guard.heartbeat_sent_count,
        )
    };

    if since_last_input < initiate_timeout {
        // False wake (an input arrived after this tick was scheduled but
        // before it fired): reschedule for the remainder.
        schedule_heartbeat_tick(entry, initiate_timeout - since_last_input);
        return;
    }

    if sent_count > 0 && since_last_input >= await_reply_timeout {
        shutdown_entry(entry, EntryShutdownReason::HeartbeatReplyTimeout);
        return;
    }

    if sent_count == 0 {
        let connection = entry.lock().connection.clone();
        if let Some(connection) = connection {
            send_heartbeat_request(&connection);
        }
        entry.lock().heartbeat_sent_count = 1;
        debug!("heartbeat probe sent");
    }

    let remaining_to_death = await_reply_timeout.saturating_sub(since_last_input);
    let delay = initiate_timeout.min(remaining_to_death).max(Duration::from_millis(1));
    schedule_heartbeat_tick(entry, delay);
}

fn shutdown_entry(entry: &Arc<Mutex<EntryInner>>, reason: EntryShutdownReason) {
    let (connection, handler) = {
        let mut guard = entry.lock();
        if guard.shutdown_fired {
            return;
        }
        guard.shutdown_fired = true;
        guard.watchdog.cancel_watch();
        (guard.connection.clone(), guard.shutdown_handler.take())
    };

    if let Some(connection) = connection {
        if !matches!(reason, EntryShutdownReason::UnderlyingConnection(_)) {
            connection.shutdown(ShutdownReason::UserInitiated);
        }
    }
    if let Some(mut handler) = handler {
        handler.on_shutdown(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FnDecoder;
    use netframe_core::endpoint::EndpointCfg;
    use netframe_core::socket_options::SocketOptionsCfg;
    use netframe_core::stats::NoOpStats;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::mpsc;

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Echo {
        value: u32,
    }

    impl Message for Echo {
        const MSG_TYPE: u16 = 1;

        fn byte_size(&self) -> usize {
            4
        }

        fn serialize_to(&self, buf: &mut BytesMut) -> bool {
            buf.extend_from_slice(&self.value.to_le_bytes());
            true
        }
    }

    fn echo_dispatch() -> Dispatch {
        let mut dispatch = Dispatch::new();
        dispatch.register(Box::new(FnDecoder::new(Echo::MSG_TYPE, |input, size| {
            if size != 4 {
                return None;
            }
            let mut raw = [0u8; 4];
            input.read_buffer(&mut raw, 4);
            Some(Echo {
                value: u32::from_le_bytes(raw),
            })
        })));
        dispatch
    }

    struct EchoBack;
    impl MessageConsumer for EchoBack {
        fn on_message(&mut self, carrier: MessageCarrier, entry: &Entry) {
            if let Ok(echo) = carrier.downcast::<Echo>() {
                entry.send(&echo);
            }
        }
    }

    struct RecordLast {
        tx: mpsc::Sender<u32>,
    }
    impl MessageConsumer for RecordLast {
        fn on_message(&mut self, carrier: MessageCarrier, _entry: &Entry) {
            if let Ok(echo) = carrier.downcast::<Echo>() {
                let _ = self.tx.send(echo.value);
            }
        }
    }

    struct NoopEntryShutdown;
    impl EntryShutdownHandler for NoopEntryShutdown {
        fn on_shutdown(&mut self, _reason: EntryShutdownReason) {}
    }

    struct RecordShutdown {
        count: Arc<AtomicU32>,
    }
    impl EntryShutdownHandler for RecordShutdown {
        fn on_shutdown(&mut self, _reason: EntryShutdownReason) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn echo_message_round_trip_over_loopback() {
        let rt = compio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let endpoint = EndpointCfg::new("127.0.0.1", 0);
            let acceptor = netframe_core::acceptor::Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                .await
                .unwrap();
            let addr = acceptor.local_addr().unwrap();

            let client_stream = TcpStream::connect(addr).await.unwrap();
            let (server_stream, _) = acceptor.accept().await.unwrap();

            let _server = Entry::new(
                server_stream,
                None,
                EntryCfg::default(),
                echo_dispatch(),
                Arc::new(NoOpStats),
                Box::new(EchoBack),
                Box::new(NoopEntryShutdown),
            );

            let (tx, rx) = mpsc::channel();
            let _client = Entry::new(
                client_stream,
                None,
                EntryCfg::default(),
                echo_dispatch(),
                Arc::new(NoOpStats),
                Box::new(RecordLast { tx }),
                Box::new(NoopEntryShutdown),
            );
            _client.send(&Echo { value: 1040 });

            compio::time::sleep(Duration::from_millis(100)).await;
            let received = rx.try_recv().unwrap();
            assert_eq!(received, 1040);
        });
    }

    #[test]
    fn heartbeat_request_triggers_reply() {
        let rt = compio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let endpoint = EndpointCfg::new("127.0.0.1", 0);
            let acceptor = netframe_core::acceptor::Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                .await
                .unwrap();
            let addr = acceptor.local_addr().unwrap();

            let mut client_stream = TcpStream::connect(addr).await.unwrap();
            let (server_stream, _) = acceptor.accept().await.unwrap();

            struct Sink;
            impl MessageConsumer for Sink {
                fn on_message(&mut self, _c: MessageCarrier, _e: &Entry) {}
            }

            let _server = Entry::new(
                server_stream,
                None,
                EntryCfg::default(),
                Dispatch::new(),
                Arc::new(NoOpStats),
                Box::new(Sink),
                Box::new(NoopEntryShutdown),
            );

            // Send a bare heartbeat_request frame directly over the raw
            // socket and confirm a 16-byte heartbeat_reply comes back.
            use compio::buf::BufResult;
            use compio::io::{AsyncReadExt, AsyncWriteExt};
            let frame = PackageHeader::heartbeat_request().encode_with_padding();
            let BufResult(result, _) = client_stream.write_all(frame.to_vec()).await;
            result.unwrap();

            let buf = vec![0u8; HEADER_LEN];
            let BufResult(result, buf) = client_stream.read_exact(buf).await;
            result.unwrap();
            let mut arr = [0u8; HEADER_LEN];
            arr.copy_from_slice(&buf);
            let reply = PackageHeader::decode(&arr);
            assert_eq!(reply.content_type(), PkgContentType::HeartbeatReply);
            assert_eq!(reply.content_size, 0);
            assert_eq!(reply.attached_binary_size, 0);
        });
    }

    #[test]
    fn bad_package_size_shuts_down_and_closes_socket() {
        let rt = compio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let endpoint = EndpointCfg::new("127.0.0.1", 0);
            let acceptor = netframe_core::acceptor::Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                .await
                .unwrap();
            let addr = acceptor.local_addr().unwrap();

            let mut client_stream = TcpStream::connect(addr).await.unwrap();
            let (server_stream, _) = acceptor.accept().await.unwrap();

            struct Sink;
            impl MessageConsumer for Sink {
                fn on_message(&mut self, _c: MessageCarrier, _e: &Entry) {}
            }

            let shutdown_count = Arc::new(AtomicU32::new(0));
            let mut cfg = EntryCfg::default();
            cfg.max_valid_package_size = 256;

            let _server = Entry::new(
                server_stream,
                None,
                cfg,
                Dispatch::new(),
                Arc::new(NoOpStats),
                Box::new(Sink),
                Box::new(RecordShutdown {
                    count: shutdown_count.clone(),
                }),
            );

            use compio::buf::BufResult;
            use compio::io::AsyncWriteExt;
            let header = PackageHeader::message(1, 257, 0);
            let mut framed = BytesMut::new();
            header.encode(&mut framed);
            let BufResult(result, _) = client_stream.write_all(framed.to_vec()).await;
            result.unwrap();

            compio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(shutdown_count.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn header_with_reserved_padding_is_skipped() {
        let rt = compio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let endpoint = EndpointCfg::new("127.0.0.1", 0);
            let acceptor = netframe_core::acceptor::Acceptor::bind(&endpoint, SocketOptionsCfg::default())
                .await
                .unwrap();
            let addr = acceptor.local_addr().unwrap();

            let mut client_stream = TcpStream::connect(addr).await.unwrap();
            let (server_stream, _) = acceptor.accept().await.unwrap();

            let (tx, rx) = mpsc::channel();
            let _server = Entry::new(
                server_stream,
                None,
                EntryCfg::default(),
                echo_dispatch(),
                Arc::new(NoOpStats),
                Box::new(RecordLast { tx }),
                Box::new(NoopEntryShutdown),
            );

            use compio::buf::BufResult;
            use compio::io::AsyncWriteExt;
            let mut header = PackageHeader::message(Echo::MSG_TYPE, 4, 0);
            header.header_size_dwords = 12;
            let mut framed = BytesMut::new();
            header.encode(&mut framed);
            framed.resize(48, 0); // 32 bytes of zero padding beyond the fixed 16
            framed.extend_from_slice(&77u32.to_le_bytes());

            let BufResult(result, _) = client_stream.write_all(framed.to_vec()).await;
            result.unwrap();

            compio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(rx.try_recv().unwrap(), 77);
        });
    }
}
