//! The locking policy seam that gates the aggressive-dispatch fast path.
//!
//! A `Connection<L>` always stores its mutable state behind
//! `Arc<parking_lot::Mutex<ConnectionInner>>` regardless of `L` — what `L`
//! controls is whether `schedule_send_aggressive_dispatch`'s inline
//! check-then-write is backed by a real strand. Under a noop strand (the
//! whole program is single-threaded, so there is no second lock behind
//! `L` to actually serialize against) the inline path can't be trusted to
//! be race-free against the write pump, so it degrades to the queued
//! `schedule_send` path instead; under a real strand it's sound to take
//! directly.

/// Chooses whether `schedule_send_aggressive_dispatch` may take its inline
/// fast path.
///
/// `NOOP = true` marks a noop strand: there is no real lock backing the
/// connection's execution context, so the fast path degrades to the
/// normal dispatch queue for correctness. `NOOP = false` marks a real
/// strand, safe for the inline fast path.
pub trait LockingPolicy: Send + Sync + 'static {
    const NOOP: bool;
}

/// Noop-strand policy: the whole program is single-threaded and no real
/// lock backs the connection's context, so the aggressive-dispatch fast
/// path always degrades to [`crate::connection::Connection::schedule_send`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocking;

impl LockingPolicy for NoopLocking {
    const NOOP: bool = true;
}

/// Real-strand policy: many threads may drive the executor, a real lock
/// backs the connection's context, and the aggressive-dispatch fast path
/// may run its check-then-write inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutexLocking;

impl LockingPolicy for MutexLocking {
    const NOOP: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_policy_flags_true() {
        assert!(NoopLocking::NOOP);
    }

    #[test]
    fn mutex_policy_flags_false() {
        assert!(!MutexLocking::NOOP);
    }
}
