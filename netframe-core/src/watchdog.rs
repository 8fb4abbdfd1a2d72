//! A per-operation timer keyed by a monotonically-increasing token.
//!
//! `start_watch` schedules a callback to fire after `duration` unless
//! cancelled first. `cancel_watch` (and any subsequent `start_watch`)
//! invalidates the previously-issued key; the fire closure compares the
//! key it captured against the current one so a race between completion
//! and a stale timer fire resolves in favor of completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct Watchdog {
    current_key: Arc<AtomicU64>,
}

impl Watchdog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_key: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Arm the watchdog. `f` is invoked with the key it was armed under,
    /// only if that key is still current when the timer fires.
    pub fn start_watch<F>(&mut self, duration: Duration, f: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let key = self.current_key.fetch_add(1, Ordering::SeqCst) + 1;

        let current_key = self.current_key.clone();
        compio::runtime::spawn(async move {
            compio::time::sleep(duration).await;
            if current_key.load(Ordering::SeqCst) == key {
                f(key);
            }
        })
        .detach();

        key
    }

    /// Discard any pending fire without arming a new one.
    pub fn cancel_watch(&mut self) {
        self.current_key.fetch_add(1, Ordering::SeqCst);
    }
}
