//! Monotonic microsecond clocks.
//!
//! Every timeout in the control unit compares elapsed monotonic time against
//! a fixed threshold; nothing is preempted. [`SystemClock`] is used in
//! production, [`ManualClock`] lets tests and simulations step time exactly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of monotonic time in microseconds.
pub trait MonotonicClock: Send {
    fn now_us(&self) -> u64;
}

/// Wall-clock-equivalent monotonic time since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    #[inline]
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Externally stepped clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_us: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_us)),
        }
    }

    pub fn set(&self, us: u64) {
        self.now.store(us, Ordering::Release);
    }

    /// Advance time; saturates instead of wrapping.
    pub fn advance(&self, us: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| Some(t.saturating_add(us)));
    }
}

impl MonotonicClock for ManualClock {
    #[inline]
    fn now_us(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
