//! Per-state tick guards.
//!
//! Each operating state evaluates, in order:
//!
//! 1. immediate checks (emergency brake, IMD, confirmed network loss) that
//!    route on the same tick, bypassing the debounce counters;
//! 2. phase subsystem checks that update the debounce counters;
//! 3. nominal progression (retro markers, flags, elapsed time);
//! 4. the combined debounce threshold check.
//!
//! Guards return a [`Verdict`]; the engine resolves it against the
//! topology. Everything a guard may read or mutate is carried by
//! [`GuardContext`].

mod fault;
mod postrun;
mod prerun;
mod run;

use tracing::debug;

use pod_common::config::PodConfig;
use pod_common::fault::{CheckPhase, FaultCause, Subsystem};
use pod_common::hardware::PodHardware;
use pod_common::state::StateId;
use pod_common::telemetry::{TelemetryCell, TelemetrySnapshot};

use crate::debounce::{DebounceCounters, NetworkMonitor};
use crate::shutdown::ShutdownSequencer;

/// Guard decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No transition.
    Stay,
    /// Take the nominal next edge.
    Next,
    /// Take the fault edge.
    Fault,
    /// Take the edge to a specific state.
    To(StateId),
}

/// Mutable view of the machine handed to a guard for one tick.
pub struct GuardContext<'a> {
    pub snapshot: &'a TelemetrySnapshot,
    /// Monotonic time at tick start [µs].
    pub now_us: u64,
    /// Time since the current state was entered [µs].
    pub elapsed_us: u64,
    pub config: &'a PodConfig,
    pub counters: &'a mut DebounceCounters,
    pub network: &'a mut NetworkMonitor,
    pub hardware: &'a mut dyn PodHardware,
    /// Retro count latched on crawl entry.
    pub crawl_retro_reference: i32,
    pub shutdown: &'a mut ShutdownSequencer,
    pub telemetry: &'a TelemetryCell,
    /// Why this tick routes to a fault, if it does.
    pub causes: FaultCause,
}

impl GuardContext<'_> {
    #[inline]
    pub fn elapsed_at_least(&self, threshold_us: u64) -> bool {
        self.elapsed_us >= threshold_us
    }

    /// Operator emergency-brake flag.
    pub fn emergency_brake(&mut self) -> bool {
        self.flag_cause(self.snapshot.flags.emergency_brake, FaultCause::EMERGENCY_BRAKE)
    }

    /// Insulation fault reported by the IMD.
    pub fn imd_failed(&mut self) -> bool {
        let failed = !self.hardware.imd_ok();
        self.flag_cause(failed, FaultCause::IMD)
    }

    /// Sample both transports; `true` once loss is confirmed.
    pub fn network_lost(&mut self) -> bool {
        let links_ok = self.hardware.links_ok();
        let lost = self
            .network
            .sample(links_ok, self.config.policy.network_loss_threshold);
        self.flag_cause(lost, FaultCause::NETWORK_LOSS)
    }

    /// Evaluate `subsystem` for `phase` and update its debounce counter.
    pub fn check(&mut self, subsystem: Subsystem, phase: CheckPhase) -> bool {
        let passed = self.snapshot.health.passes(subsystem, phase);
        let count = self.counters.record(subsystem, passed);
        if !passed {
            debug!(
                subsystem = subsystem.name(),
                ?phase,
                count,
                "Subsystem check failed"
            );
        }
        passed
    }

    /// Combined threshold check across all three counters.
    pub fn debounce_tripped(&mut self) -> bool {
        self.debounce_tripped_among(&Subsystem::ALL)
    }

    /// Threshold check over the counters of `subsystems` only.
    pub fn debounce_tripped_among(&mut self, subsystems: &[Subsystem]) -> bool {
        let tripped = self
            .counters
            .tripped_among(subsystems, self.config.policy.debounce_threshold);
        self.causes |= tripped;
        !tripped.is_empty()
    }

    /// Record `cause` when `hit`, then pass `hit` through.
    #[inline]
    pub fn flag_cause(&mut self, hit: bool, cause: FaultCause) -> bool {
        if hit {
            self.causes |= cause;
        }
        hit
    }

    /// Debounce check as the last step of a guard.
    #[inline]
    fn settle(&mut self) -> Verdict {
        if self.debounce_tripped() {
            Verdict::Fault
        } else {
            Verdict::Stay
        }
    }
}

/// Run the tick guard of `state`.
pub fn evaluate(state: StateId, ctx: &mut GuardContext<'_>) -> Verdict {
    match state {
        StateId::Idle => prerun::idle(ctx),
        StateId::Pumpdown => prerun::pumpdown(ctx),
        StateId::ServicingPrecharge => prerun::servicing_precharge(ctx),
        StateId::Propulsion => run::propulsion(ctx),
        StateId::Braking => run::braking(ctx),
        StateId::Stopped => run::stopped(ctx),
        StateId::Crawl => run::crawl(ctx),
        StateId::PostRun => postrun::post_run(ctx),
        StateId::SafeToApproach => postrun::safe_to_approach(ctx),
        StateId::NonRunFault | StateId::RunFault => fault::contain(state, ctx),
    }
}
