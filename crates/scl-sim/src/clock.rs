//! Tick sources for timer evaluation.
//!
//! A `TickSource` is owned per engine and shared with whoever drives it (the
//! test runner switches it to virtual mode for the duration of a script).

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// Millisecond clock consulted once per scan.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
struct VirtualState {
    enabled: bool,
    now: i64,
}

#[derive(Debug)]
struct TickInner {
    start: Instant,
    virtual_state: Mutex<VirtualState>,
}

/// Real monotonic time, or a manually advanced virtual counter.
#[derive(Debug, Clone)]
pub struct TickSource {
    inner: Arc<TickInner>,
}

impl TickSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TickInner {
                start: Instant::now(),
                virtual_state: Mutex::new(VirtualState::default()),
            }),
        }
    }

    /// Milliseconds of monotonic time since this source was created.
    #[must_use]
    pub fn real_now_ms(&self) -> i64 {
        i64::try_from(self.inner.start.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.inner.virtual_state.lock().enabled
    }

    /// Switches to virtual time, seeded from the real clock so running timers
    /// keep a consistent base.
    pub fn enable_virtual_from_real(&self) {
        let seed = self.real_now_ms();
        let mut state = self.inner.virtual_state.lock();
        state.enabled = true;
        state.now = seed;
        tracing::debug!(seed, "virtual time enabled");
    }

    /// Returns to real time and clears the virtual counter.
    pub fn disable_virtual(&self) {
        let mut state = self.inner.virtual_state.lock();
        state.enabled = false;
        state.now = 0;
    }

    /// Advances the virtual counter; no effect in real mode.
    pub fn advance(&self, ms: i64) -> i64 {
        let mut state = self.inner.virtual_state.lock();
        if state.enabled {
            state.now = state.now.saturating_add(ms);
        }
        state.now
    }

    /// Enables virtual mode at an explicit time.
    pub fn set_virtual_now(&self, ms: i64) {
        let mut state = self.inner.virtual_state.lock();
        state.enabled = true;
        state.now = ms;
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TickSource {
    fn now_ms(&self) -> i64 {
        let state = *self.inner.virtual_state.lock();
        if state.enabled {
            state.now
        } else {
            self.real_now_ms()
        }
    }
}

/// Clock frozen at a fixed time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_mode_is_shared_between_clones() {
        let source = TickSource::new();
        let handle = source.clone();
        source.set_virtual_now(1_000);
        assert!(handle.is_virtual());
        handle.advance(250);
        assert_eq!(source.now_ms(), 1_250);
    }

    #[test]
    fn disabling_returns_to_real_time() {
        let source = TickSource::new();
        source.set_virtual_now(5_000_000);
        source.disable_virtual();
        assert!(!source.is_virtual());
        assert!(source.now_ms() < 5_000_000);
        assert_eq!(source.advance(10), 0);
    }

    #[test]
    fn seeding_from_real_time() {
        let source = TickSource::new();
        source.enable_virtual_from_real();
        let seeded = source.now_ms();
        source.advance(10);
        assert_eq!(source.now_ms(), seeded + 10);
    }
}
