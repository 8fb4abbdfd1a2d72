//! The per-connection state machine: write queue, read loop, timeout-guarded
//! writes, and one-shot shutdown.
//!
//! State lives behind `Arc<parking_lot::Mutex<ConnectionInner>>` regardless
//! of the locking policy in use — `L::NOOP` does not change storage, it only
//! changes whether [`Connection::schedule_send_aggressive_dispatch`] is
//! allowed to run its inline check-then-write instead of degrading to
//! `schedule_send`'s always-safe queued path. A noop strand (`L::NOOP ==
//! true`) has no real lock behind it for the inline path to trust, so it
//! always degrades; a real strand (`L::NOOP == false`) allows the inline
//! path.
//!
//! `compio`'s I/O is completion-based rather than readiness-based, so there
//! is no true non-blocking "try write" to distinguish a synchronous fast
//! path from an asynchronous one the way a readiness-model reactor would.
//! Both paths issue the same single completion write; `QUICK_SYNC_WRITE_HEURISTIC`
//! instead only selects which stats counter (`record_bytes_tx_sync` vs
//! `record_bytes_tx_async`) the transfer is attributed to.
//!
//! The write-side timeout is a single `compio::time::timeout` wrapped
//! around the sequence's write future rather than a `Watchdog`: the await
//! already serializes the race correctly, and a detached `Watchdog` callback
//! would only add a second, redundant cancellation signal. `Watchdog` is
//! reserved for timers that must survive across multiple logical steps with
//! no single future spanning the whole budget (the heartbeat state machine).

use crate::alloc::{IoArena, IoBytes};
use crate::buffer::HeterogeneousBuffer;
use crate::error::{SendOutcome, ShutdownReason, UpdateSocketOptionsResult};
use crate::locking::{LockingPolicy, NoopLocking};
use crate::socket_options::SocketOptionsCfg;
use crate::stats::StatsDriver;

use bytes::{Bytes, BytesMut};
use compio::buf::BufResult;
use compio::io::{AsyncRead, AsyncWriteExt};
use compio::net::TcpStream;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::io;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Maximum buffers gathered into one [`WritableSequence`].
pub const MAX_IOV: usize = 16;
/// A write whose sequence totals at most this many bytes is classified as
/// "sync" for stats purposes; above it, "async".
pub const QUICK_SYNC_WRITE_HEURISTIC: usize = 64 * 1024;
/// Consecutive small buffers are fused into one allocation, up to this
/// size, when a write-queue sequence needs a free slot.
pub const CONCAT_MAX: usize = 16 * 1024;

/// Opaque, process-wide-unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Per-connection tuning: input buffer size and the write-timeout budget.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionCfg {
    pub input_buffer_size: usize,
    pub write_timeout_per_mb: Duration,
}

impl Default for ConnectionCfg {
    fn default() -> Self {
        Self {
            input_buffer_size: 256 * 1024,
            write_timeout_per_mb: Duration::from_secs(1),
        }
    }
}

impl ConnectionCfg {
    /// `ceil(bytes / 1 MiB) * write_timeout_per_mb`, with the division
    /// skipped entirely when `bytes` already fits in one unit.
    #[must_use]
    pub fn make_write_timeout_per_buffer(&self, bytes: usize) -> Duration {
        const ONE_MIB: usize = 1024 * 1024;
        let units = if bytes <= ONE_MIB {
            1
        } else {
            bytes.div_ceil(ONE_MIB)
        };
        self.write_timeout_per_mb * units as u32
    }
}

pub type SendCallback = Box<dyn FnOnce(SendOutcome) + Send>;

/// One batch of buffers consumed by a single write attempt. The callback
/// contract is batch-wide: a callback attached while this is the tail
/// sequence fires once the whole batch completes, not per-buffer.
#[derive(Default)]
struct WritableSequence {
    bufs: SmallVec<[Bytes; MAX_IOV]>,
    callbacks: SmallVec<[SendCallback; 1]>,
}

impl WritableSequence {
    fn total_size(&self) -> usize {
        self.bufs.iter().map(Bytes::len).sum()
    }

    fn is_full(&self) -> bool {
        self.bufs.len() >= MAX_IOV
    }

    fn fire(self, outcome: SendOutcome) {
        for cb in self.callbacks {
            cb(outcome.clone());
        }
    }

    /// Fuse consecutive buffers whose running sum stays within `CONCAT_MAX`.
    /// Returns `true` if fusing freed at least one slot.
    fn concat_small_buffers(&mut self) -> bool {
        if self.bufs.len() < 2 {
            return false;
        }
        let mut fused: SmallVec<[Bytes; MAX_IOV]> = SmallVec::new();
        let mut freed = false;
        let mut i = 0;
        while i < self.bufs.len() {
            let mut sum = self.bufs[i].len();
            let mut j = i + 1;
            while j < self.bufs.len() && sum + self.bufs[j].len() <= CONCAT_MAX {
                sum += self.bufs[j].len();
                j += 1;
            }
            if j - i > 1 {
                let mut merged = BytesMut::with_capacity(sum);
                for buf in &self.bufs[i..j] {
                    merged.extend_from_slice(buf);
                }
                fused.push(merged.freeze());
                freed = true;
            } else {
                fused.push(self.bufs[i].clone());
            }
            i = j;
        }
        self.bufs = fused;
        freed
    }
}

/// Handed to the input handler after every successful read.
pub struct InputContext<'a> {
    pub buf: Bytes,
    pub connection_id: ConnectionId,
    pub remote: Option<&'a str>,
    next_read_buffer_size: &'a mut Option<usize>,
}

impl<'a> InputContext<'a> {
    /// Request that the next read use a buffer of at least `size` bytes.
    /// If never called, the connection reuses its current read-buffer size.
    pub fn set_next_read_buffer_size(&mut self, size: usize) {
        *self.next_read_buffer_size = Some(size);
    }
}

/// Consumes bytes handed up from the read loop.
pub trait InputHandler: Send {
    fn on_input(&mut self, ctx: InputContext<'_>);
}

/// Notified exactly once when the connection shuts down.
pub trait ShutdownHandler: Send {
    fn on_shutdown(&mut self, reason: ShutdownReason);
}

struct ConnectionInner {
    id: ConnectionId,
    remote: Option<String>,
    stream: Option<TcpStream>,
    cfg: ConnectionCfg,
    arena: IoArena,
    next_read_size: usize,
    read_enabled: bool,
    write_in_flight: bool,
    shutdown_called: bool,
    write_queue: VecDeque<WritableSequence>,
    stats: Arc<dyn StatsDriver>,
    input_handler: Box<dyn InputHandler>,
    shutdown_handler: Box<dyn ShutdownHandler>,
}

impl ConnectionInner {
    /// Ensure the tail sequence can take one more buffer, per the
    /// append/concat/push-new-sequence rule.
    fn make_room_at_tail(&mut self) {
        if self.write_queue.is_empty() {
            self.write_queue.push_back(WritableSequence::default());
            return;
        }
        if !self.write_queue.back().unwrap().is_full() {
            return;
        }
        if self.write_queue.len() > 1 {
            let freed = self.write_queue.back_mut().unwrap().concat_small_buffers();
            if freed && !self.write_queue.back().unwrap().is_full() {
                return;
            }
        }
        self.write_queue.push_back(WritableSequence::default());
    }

    fn append_buffer(&mut self, buf: Bytes) {
        self.make_room_at_tail();
        self.write_queue.back_mut().unwrap().bufs.push(buf);
    }

    fn append_callback(&mut self, cb: SendCallback) {
        if self.write_queue.is_empty() {
            self.write_queue.push_back(WritableSequence::default());
        }
        self.write_queue.back_mut().unwrap().callbacks.push(cb);
    }
}

/// The per-socket state machine: read pump, write queue, timeout-guarded
/// writes, one-shot shutdown.
pub struct Connection<L: LockingPolicy = NoopLocking> {
    inner: Arc<Mutex<ConnectionInner>>,
    _policy: PhantomData<L>,
}

impl<L: LockingPolicy> Clone for Connection<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _policy: PhantomData,
        }
    }
}

impl<L: LockingPolicy> Connection<L> {
    #[must_use]
    pub fn new(
        stream: TcpStream,
        remote: Option<String>,
        cfg: ConnectionCfg,
        stats: Arc<dyn StatsDriver>,
        input_handler: Box<dyn InputHandler>,
        shutdown_handler: Box<dyn ShutdownHandler>,
    ) -> Self {
        let next_read_size = cfg.input_buffer_size;
        let inner = ConnectionInner {
            id: ConnectionId::next(),
            remote,
            stream: Some(stream),
            cfg,
            arena: IoArena::new(),
            next_read_size,
            read_enabled: false,
            write_in_flight: false,
            shutdown_called: false,
            write_queue: VecDeque::new(),
            stats,
            input_handler,
            shutdown_handler,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            _policy: PhantomData,
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.inner.lock().id
    }

    #[must_use]
    pub fn remote_endpoint(&self) -> Option<String> {
        self.inner.lock().remote.clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.lock().stream.is_some()
    }

    /// Idempotently arm the read loop.
    pub fn start_reading(&self) {
        let mut guard = self.inner.lock();
        if guard.read_enabled {
            return;
        }
        guard.read_enabled = true;
        drop(guard);

        let inner = self.inner.clone();
        compio::runtime::spawn(async move {
            read_loop(inner).await;
        })
        .detach();
    }

    /// Enqueue `buf` for sending. `callback`, if given, fires once the
    /// *whole sequence* this buffer lands in completes, not per-buffer.
    pub fn schedule_send(&self, buf: HeterogeneousBuffer, callback: Option<SendCallback>) {
        let bytes = buf.into_bytes();
        let mut guard = self.inner.lock();
        if guard.shutdown_called {
            drop(guard);
            if let Some(cb) = callback {
                cb(SendOutcome::RejectedScheduleSend);
            }
            return;
        }
        guard.append_buffer(bytes);
        if let Some(cb) = callback {
            guard.append_callback(cb);
        }
        drop(guard);
        begin_write_if_idle(&self.inner);
    }

    /// Fast path for callers backed by a real lock/strand (`!L::NOOP`):
    /// attempt a direct enqueue-and-kick inline while no write is in
    /// flight, skipping a dedicated dispatch for the common case. The
    /// inline check-then-write here is only sound when a real lock is
    /// actually being taken, so `NoopLocking` (`L::NOOP == true`, no real
    /// lock behind it) degrades to [`Connection::schedule_send`] instead
    /// of racing the write pump. Also falls back when a write is already
    /// in flight or the connection is closed.
    pub fn schedule_send_aggressive_dispatch(
        &self,
        buf: HeterogeneousBuffer,
        callback: Option<SendCallback>,
    ) {
        if L::NOOP {
            self.schedule_send(buf, callback);
            return;
        }

        let bytes = buf.into_bytes();
        if bytes.len() >= QUICK_SYNC_WRITE_HEURISTIC {
            self.schedule_send(HeterogeneousBuffer::Shared(bytes), callback);
            return;
        }

        let mut guard = self.inner.lock();
        if guard.shutdown_called || guard.write_in_flight || guard.stream.is_none() {
            drop(guard);
            self.schedule_send(HeterogeneousBuffer::Shared(bytes), callback);
            return;
        }
        guard.append_buffer(bytes);
        if let Some(cb) = callback {
            guard.append_callback(cb);
        }
        drop(guard);
        begin_write_if_idle(&self.inner);
    }

    /// Re-apply socket options to the live socket, if connected.
    pub fn update_socket_options(&self, cfg: &SocketOptionsCfg) -> UpdateSocketOptionsResult {
        let guard = self.inner.lock();
        cfg.apply(guard.stream.as_ref())
    }

    /// One-shot shutdown: closes the socket, fires the shutdown handler at
    /// most once, and drains the write queue's callbacks with `DidntSend`.
    pub fn shutdown(&self, reason: ShutdownReason) {
        shutdown_impl(&self.inner, reason);
    }
}

fn begin_write_if_idle(inner: &Arc<Mutex<ConnectionInner>>) {
    let (total, write_timeout) = {
        let mut guard = inner.lock();
        if guard.write_in_flight || guard.shutdown_called {
            return;
        }
        let Some(front) = guard.write_queue.front() else {
            return;
        };
        if front.bufs.is_empty() {
            return;
        }
        guard.write_in_flight = true;
        let total = front.total_size();
        let write_timeout = guard.cfg.make_write_timeout_per_buffer(total);
        // Freeze the head: make sure a fresh empty sequence is at the back
        // so a concurrent append never mutates the slice in flight.
        if guard.write_queue.len() == 1 {
            guard.write_queue.push_back(WritableSequence::default());
        }
        (total, write_timeout)
    };

    let inner = inner.clone();
    compio::runtime::spawn(async move {
        drive_one_write(inner, total, write_timeout).await;
    })
    .detach();
}

fn finish_front_sequence(inner: &Arc<Mutex<ConnectionInner>>, outcome: SendOutcome) {
    let seq = inner.lock().write_queue.pop_front();
    if let Some(seq) = seq {
        seq.fire(outcome);
    }
}

fn clear_in_flight_and_continue(inner: &Arc<Mutex<ConnectionInner>>) {
    inner.lock().write_in_flight = false;
    begin_write_if_idle(inner);
}

async fn drive_one_write(inner: Arc<Mutex<ConnectionInner>>, total: usize, write_timeout: Duration) {
    let Some(mut stream) = inner.lock().stream.take() else {
        finish_front_sequence(&inner, SendOutcome::DidntSend);
        return;
    };

    let bufs: SmallVec<[Bytes; MAX_IOV]> = inner
        .lock()
        .write_queue
        .front()
        .map(|s| s.bufs.clone())
        .unwrap_or_default();

    let write_fut = async {
        for buf in &bufs {
            let BufResult(result, _) =
                AsyncWriteExt::write_all(&mut stream, IoBytes::new(buf.clone())).await;
            result?;
        }
        io::Result::Ok(stream)
    };

    match compio::time::timeout(write_timeout, write_fut).await {
        Err(_elapsed) => {
            warn!(bytes = total, "write timed out before completion");
            finish_front_sequence(
                &inner,
                SendOutcome::IoError(Arc::new(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "write did not complete within the per-buffer budget",
                ))),
            );
            shutdown_impl(&inner, ShutdownReason::WriteTimeout);
        }
        Ok(Ok(stream)) => {
            {
                let mut guard = inner.lock();
                if total <= QUICK_SYNC_WRITE_HEURISTIC {
                    guard.stats.record_bytes_tx_sync(total);
                } else {
                    guard.stats.record_bytes_tx_async(total);
                }
                guard.stream = Some(stream);
            }
            trace!(bytes = total, "write completed");
            finish_front_sequence(&inner, SendOutcome::Success);
            clear_in_flight_and_continue(&inner);
        }
        Ok(Err(e)) => {
            debug!(error = %e, "write failed");
            let reason = ShutdownReason::io(io::Error::new(e.kind(), e.to_string()));
            finish_front_sequence(&inner, SendOutcome::IoError(Arc::new(e)));
            shutdown_impl(&inner, reason);
        }
    }
}

async fn read_loop(inner: Arc<Mutex<ConnectionInner>>) {
    loop {
        let (mut stream, slab) = {
            let mut guard = inner.lock();
            if !guard.read_enabled || guard.stream.is_none() {
                return;
            }
            let stream = guard.stream.take().unwrap();
            let size = guard.next_read_size;
            let slab = guard.arena.alloc_mut(size);
            (stream, slab)
        };

        let BufResult(result, slab) = AsyncRead::read(&mut stream, slab).await;

        match result {
            Ok(0) => {
                drop(stream);
                trace!("connection closed (eof)");
                shutdown_impl(&inner, ShutdownReason::Eof);
                return;
            }
            Ok(n) => {
                let bytes = slab.freeze();
                let mut guard = inner.lock();
                guard.stream = Some(stream);
                guard.stats.record_bytes_rx_async(n);

                let mut next_read_buffer_size = None;
                {
                    let ctx = InputContext {
                        buf: bytes,
                        connection_id: guard.id,
                        remote: guard.remote.as_deref(),
                        next_read_buffer_size: &mut next_read_buffer_size,
                    };
                    guard.input_handler.on_input(ctx);
                }
                if let Some(size) = next_read_buffer_size {
                    guard.next_read_size = size;
                }
                let keep_going = guard.read_enabled && guard.stream.is_some();
                drop(guard);
                if !keep_going {
                    return;
                }
            }
            Err(e) => {
                drop(stream);
                let reason = if e.kind() == io::ErrorKind::UnexpectedEof {
                    ShutdownReason::Eof
                } else {
                    ShutdownReason::io(e)
                };
                debug!(error = %reason, "read loop stopping");
                shutdown_impl(&inner, reason);
                return;
            }
        }
    }
}

fn shutdown_impl(inner: &Arc<Mutex<ConnectionInner>>, reason: ShutdownReason) {
    let drained = {
        let mut guard = inner.lock();
        if guard.shutdown_called {
            return;
        }
        guard.shutdown_called = true;
        guard.read_enabled = false;
        if let Some(stream) = guard.stream.take() {
            if let Err(e) = crate::tcp::shutdown_gracefully(&stream) {
                trace!(error = %e, "socket shutdown failed (already closed?)");
            }
        }
        guard.write_queue.drain(..).collect::<Vec<_>>()
    };

    for seq in drained {
        seq.fire(SendOutcome::DidntSend);
    }

    inner.lock().shutdown_handler.on_shutdown(reason);
}
