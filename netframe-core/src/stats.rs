//! Instrumentation hooks for the connection engine.
//!
//! `StatsDriver` is the seam; `NoOpStats` costs nothing when a caller does
//! not care, `AtomicStats` gives a lock-free counter set suitable for
//! periodic scraping.

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Direction a message or byte count moved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rx,
    Tx,
}

/// Observability seam for a `Connection`. All methods take `&self` since
/// instances are shared behind an `Arc` across the read and write paths.
pub trait StatsDriver: Send + Sync {
    fn record_bytes_rx_sync(&self, _bytes: usize) {}
    fn record_bytes_rx_async(&self, _bytes: usize) {}
    fn record_bytes_tx_sync(&self, _bytes: usize) {}
    fn record_bytes_tx_async(&self, _bytes: usize) {}
    fn record_would_block(&self) {}
    fn record_message(&self, _type_tag: u16, _direction: Direction, _bytes: usize) {}
}

/// Discards everything. The default for a `Connection` that doesn't ask.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpStats;

impl StatsDriver for NoOpStats {}

#[derive(Debug, Default)]
struct PerTypeCounters {
    rx_count: u64,
    rx_bytes: u64,
    tx_count: u64,
    tx_bytes: u64,
}

/// Lock-free aggregate counters, plus a per-message-type breakdown behind
/// a small mutex (scraped rarely, never on the hot byte-counting path).
#[derive(Default)]
pub struct AtomicStats {
    bytes_rx_sync: AtomicU64,
    bytes_rx_async: AtomicU64,
    bytes_tx_sync: AtomicU64,
    bytes_tx_async: AtomicU64,
    would_block_count: AtomicU64,
    by_type: Mutex<HashMap<u16, PerTypeCounters>>,
}

impl AtomicStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bytes_rx_sync(&self) -> u64 {
        self.bytes_rx_sync.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_rx_async(&self) -> u64 {
        self.bytes_rx_async.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_tx_sync(&self) -> u64 {
        self.bytes_tx_sync.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_tx_async(&self) -> u64 {
        self.bytes_tx_async.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn would_block_count(&self) -> u64 {
        self.would_block_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn message_counts(&self, type_tag: u16) -> (u64, u64) {
        let guard = self.by_type.lock();
        guard
            .get(&type_tag)
            .map_or((0, 0), |c| (c.rx_count, c.tx_count))
    }
}

impl StatsDriver for AtomicStats {
    fn record_bytes_rx_sync(&self, bytes: usize) {
        self.bytes_rx_sync.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_bytes_rx_async(&self, bytes: usize) {
        self.bytes_rx_async.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_bytes_tx_sync(&self, bytes: usize) {
        self.bytes_tx_sync.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_bytes_tx_async(&self, bytes: usize) {
        self.bytes_tx_async.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_would_block(&self) {
        self.would_block_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_message(&self, type_tag: u16, direction: Direction, bytes: usize) {
        let mut guard = self.by_type.lock();
        let entry = guard.entry(type_tag).or_default();
        match direction {
            Direction::Rx => {
                entry.rx_count += 1;
                entry.rx_bytes += bytes as u64;
            }
            Direction::Tx => {
                entry.tx_count += 1;
                entry.tx_bytes += bytes as u64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_stats_accepts_everything() {
        let stats = NoOpStats;
        stats.record_bytes_rx_sync(100);
        stats.record_message(1, Direction::Tx, 32);
    }

    #[test]
    fn atomic_stats_accumulates_bytes() {
        let stats = AtomicStats::new();
        stats.record_bytes_rx_sync(10);
        stats.record_bytes_rx_sync(20);
        stats.record_bytes_tx_async(5);
        assert_eq!(stats.bytes_rx_sync(), 30);
        assert_eq!(stats.bytes_tx_async(), 5);
    }

    #[test]
    fn atomic_stats_tracks_per_type_counts() {
        let stats = AtomicStats::new();
        stats.record_message(7, Direction::Rx, 16);
        stats.record_message(7, Direction::Rx, 16);
        stats.record_message(7, Direction::Tx, 8);
        assert_eq!(stats.message_counts(7), (2, 1));
        assert_eq!(stats.message_counts(9), (0, 0));
    }
}
