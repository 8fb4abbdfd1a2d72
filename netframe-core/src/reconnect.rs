//! Exponential-backoff reconnect state for client-side `Connector`s.
//!
//! Server-side `Acceptor`s never reconnect; this is only consulted by a
//! `Connector` configured with `auto_reconnect = true`.

use std::time::Duration;

/// Reconnect back-off configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectCfg {
    /// Base delay before the first reconnect attempt.
    pub base_interval: Duration,
    /// Ceiling the doubling back-off is capped at. `Duration::ZERO` disables
    /// the cap (pure geometric growth).
    pub max_interval: Duration,
}

impl Default for ReconnectCfg {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(10_000),
            max_interval: Duration::ZERO,
        }
    }
}

/// Tracks the current back-off state across repeated reconnect attempts.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    cfg: ReconnectCfg,
    attempt: u32,
    current_interval: Duration,
}

impl ReconnectState {
    #[must_use]
    pub const fn new(cfg: ReconnectCfg) -> Self {
        let current_interval = cfg.base_interval;
        Self {
            cfg,
            attempt: 0,
            current_interval,
        }
    }

    /// Compute the delay for the next attempt, then double it (capped)
    /// for the attempt after that.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_interval;
        self.attempt += 1;

        self.current_interval = self.cfg.base_interval * (1_u32 << self.attempt.min(10));
        if !self.cfg.max_interval.is_zero() && self.current_interval > self.cfg.max_interval {
            self.current_interval = self.cfg.max_interval;
        }

        delay
    }

    /// Reset back to the base interval after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.current_interval = self.cfg.base_interval;
    }

    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_attempt_and_caps() {
        let cfg = ReconnectCfg {
            base_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(500),
        };
        let mut state = ReconnectState::new(cfg);
        assert_eq!(state.next_delay(), Duration::from_millis(100));
        assert_eq!(state.next_delay(), Duration::from_millis(200));
        assert_eq!(state.next_delay(), Duration::from_millis(400));
        assert_eq!(state.next_delay(), Duration::from_millis(500));
        assert_eq!(state.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn reset_returns_to_base() {
        let cfg = ReconnectCfg {
            base_interval: Duration::from_millis(50),
            max_interval: Duration::ZERO,
        };
        let mut state = ReconnectState::new(cfg);
        state.next_delay();
        state.next_delay();
        assert_eq!(state.attempt(), 2);
        state.reset();
        assert_eq!(state.attempt(), 0);
        assert_eq!(state.next_delay(), Duration::from_millis(50));
    }
}
