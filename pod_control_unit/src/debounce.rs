//! Consecutive-failure counters.
//!
//! A failing check increments its counter; any passing check resets it to
//! zero. There is no partial credit. A counter at or above the configured
//! threshold has tripped.

use pod_common::fault::{FaultCause, Subsystem};

/// Single consecutive-failure counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceCounter(u32);

impl DebounceCounter {
    /// Record one check result; returns the new count.
    #[inline]
    pub fn record(&mut self, passed: bool) -> u32 {
        self.0 = if passed { 0 } else { self.0.saturating_add(1) };
        self.0
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub const fn tripped(self, threshold: u32) -> bool {
        self.0 >= threshold
    }
}

/// Pressure, battery and motor-controller counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceCounters {
    pub pressure: DebounceCounter,
    pub battery: DebounceCounter,
    pub rms: DebounceCounter,
}

impl DebounceCounters {
    #[inline]
    fn slot(&mut self, subsystem: Subsystem) -> &mut DebounceCounter {
        match subsystem {
            Subsystem::Pressure => &mut self.pressure,
            Subsystem::Battery => &mut self.battery,
            Subsystem::Rms => &mut self.rms,
        }
    }

    pub fn record(&mut self, subsystem: Subsystem, passed: bool) -> u32 {
        self.slot(subsystem).record(passed)
    }

    pub fn get(&self, subsystem: Subsystem) -> u32 {
        match subsystem {
            Subsystem::Pressure => self.pressure.count(),
            Subsystem::Battery => self.battery.count(),
            Subsystem::Rms => self.rms.count(),
        }
    }

    pub fn reset_one(&mut self, subsystem: Subsystem) {
        self.slot(subsystem).reset();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Causes for every counter at or above `threshold` (empty if none).
    pub fn tripped(&self, threshold: u32) -> FaultCause {
        self.tripped_among(&Subsystem::ALL, threshold)
    }

    /// Like [`tripped`](Self::tripped), restricted to `subsystems`.
    pub fn tripped_among(&self, subsystems: &[Subsystem], threshold: u32) -> FaultCause {
        subsystems
            .iter()
            .filter(|s| self.get(**s) >= threshold)
            .fold(FaultCause::empty(), |acc, s| acc | FaultCause::debounced(*s))
    }
}

// ─── Network Monitor ────────────────────────────────────────────────

/// Dual-transport link supervisor.
///
/// Counts consecutive samples where either transport is down. Loss is
/// confirmed once the count reaches the threshold; one healthy sample
/// clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkMonitor {
    consecutive_failures: u32,
}

impl NetworkMonitor {
    /// Record one sample; returns `true` when loss is confirmed.
    pub fn sample(&mut self, links_ok: bool, threshold: u32) -> bool {
        if links_ok {
            self.consecutive_failures = 0;
            false
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.consecutive_failures >= threshold
        }
    }

    #[inline]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
