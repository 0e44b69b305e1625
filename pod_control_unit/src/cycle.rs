//! Deterministic control cycle: tick the state machine at a fixed period.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.
//!
//! ## Cycle Loop
//! With the `rt` feature, absolute-time sleep on `CLOCK_MONOTONIC` for
//! drift-free pacing. Without it, `std::thread::sleep` for the remainder of
//! the period. Overruns are counted and logged; fault containment keeps
//! running regardless.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use pod_common::clock::MonotonicClock;
use pod_common::hardware::PodHardware;

use crate::machine::PodStateMachine;

/// Cycles between periodic statistics log lines.
const STATS_LOG_INTERVAL: u64 = 1_000;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (time between expected and actual wake).
    pub max_latency_ns: i64,
    /// Cycles in which the state changed.
    pub transitions: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
            transitions: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
    /// Monotonic clock read failed.
    #[error("clock error: {0}")]
    Clock(String),
}

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch stack pages so the loop never faults them in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into a local array.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a specific CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup. All calls are no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Paces the state machine at the configured cycle time.
pub struct CycleRunner<H: PodHardware, C: MonotonicClock> {
    machine: PodStateMachine<H, C>,
    stats: CycleStats,
    cycle_time_ns: i64,
    running: Arc<AtomicBool>,
    max_cycles: Option<u64>,
}

impl<H: PodHardware, C: MonotonicClock> CycleRunner<H, C> {
    pub fn new(machine: PodStateMachine<H, C>, running: Arc<AtomicBool>) -> Self {
        let cycle_time_ns = machine.config().cycle.cycle_time_us as i64 * 1_000;
        Self {
            machine,
            stats: CycleStats::new(),
            cycle_time_ns,
            running,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` ticks.
    pub fn with_max_cycles(mut self, cycles: Option<u64>) -> Self {
        self.max_cycles = cycles;
        self
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn machine(&self) -> &PodStateMachine<H, C> {
        &self.machine
    }

    pub fn into_machine(self) -> PodStateMachine<H, C> {
        self.machine
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    /// Run until the running flag drops or the cycle limit is reached.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(
            cycle_time_us = self.cycle_time_ns / 1_000,
            state = self.machine.current_name(),
            "Entering control loop"
        );

        #[cfg(feature = "rt")]
        self.run_rt_loop()?;

        #[cfg(not(feature = "rt"))]
        self.run_sim_loop();

        info!(
            cycles = self.stats.cycle_count,
            overruns = self.stats.overruns,
            transitions = self.stats.transitions,
            avg_cycle_ns = self.stats.avg_cycle_ns(),
            max_cycle_ns = self.stats.max_cycle_ns,
            state = self.machine.current_name(),
            "Control loop stopped"
        );
        Ok(())
    }

    /// RT cycle loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::Clock(e.to_string()));
        let mut next_wake = now()?;

        while self.should_continue() {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now()?;
            self.cycle_body();
            let cycle_end = now()?;

            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            let latency_ns = (timespec_diff_ns(&cycle_start, &next_wake) + self.cycle_time_ns).abs();
            self.finish_cycle(duration_ns, latency_ns);

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    /// Simulation cycle loop using `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns as u64);

        while self.should_continue() {
            let cycle_start = Instant::now();
            self.cycle_body();
            let elapsed = cycle_start.elapsed();
            self.finish_cycle(elapsed.as_nanos() as i64, 0);

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// One tick of the state machine.
    pub fn cycle_body(&mut self) {
        if self.machine.tick().entered().is_some() {
            self.stats.transitions += 1;
        }
    }

    fn finish_cycle(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);

        if duration_ns > self.cycle_time_ns {
            self.stats.overruns += 1;
            warn!(
                duration_ns,
                budget_ns = self.cycle_time_ns,
                "Cycle overrun"
            );
        }

        if self.stats.cycle_count % STATS_LOG_INTERVAL == 0 {
            debug!(
                cycles = self.stats.cycle_count,
                avg_cycle_ns = self.stats.avg_cycle_ns(),
                max_cycle_ns = self.stats.max_cycle_ns,
                max_latency_ns = self.stats.max_latency_ns,
                state = self.machine.current_name(),
                "Cycle statistics"
            );
        }
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Compute the difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
