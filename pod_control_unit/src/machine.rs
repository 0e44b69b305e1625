//! Pod state machine execution engine.
//!
//! [`PodStateMachine`] owns the current state and every piece of mutable
//! context the guards need. One [`tick`](PodStateMachine::tick) per control
//! cycle:
//!
//! 1. A pending override takes absolute priority. An unknown name is logged
//!    and dropped. A known name lands the machine in that state, running the
//!    edge action first if an edge exists (its result is ignored) and then
//!    the target's entry action.
//! 2. Otherwise the current state's guard runs against one telemetry
//!    snapshot. `Stay` ends the tick.
//! 3. A requested edge runs its action. Success enters the target; failure
//!    enters the *current* state's fault state instead. No retry.
//!
//! Entry re-stamps the phase timer, so every elapsed-time threshold is
//! measured from the moment the state was (re-)entered.

use tracing::{debug, error, info, warn};

use pod_common::clock::MonotonicClock;
use pod_common::command::OverrideSlot;
use pod_common::config::PodConfig;
use pod_common::fault::FaultCause;
use pod_common::hardware::PodHardware;
use pod_common::state::StateId;
use pod_common::telemetry::{TelemetryCell, TelemetrySnapshot};

use crate::debounce::{DebounceCounters, NetworkMonitor};
use crate::guard::{self, GuardContext, Verdict};
use crate::shutdown::ShutdownSequencer;
use crate::topology::{Topology, Transition};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Guard kept the current state.
    Stayed,
    /// Guard-driven edge taken.
    Transitioned { from: StateId, to: StateId },
    /// Edge action failed; landed in the source's fault state.
    Rerouted {
        from: StateId,
        attempted: StateId,
        to: StateId,
    },
    /// Operator override applied.
    Overridden { from: StateId, to: StateId },
    /// Override named no known state; nothing changed.
    OverrideIgnored,
}

impl TickOutcome {
    /// State after the tick, if it changed.
    pub const fn entered(&self) -> Option<StateId> {
        match *self {
            Self::Transitioned { to, .. } | Self::Rerouted { to, .. } | Self::Overridden { to, .. } => {
                Some(to)
            }
            Self::Stayed | Self::OverrideIgnored => None,
        }
    }
}

/// Owned pod state machine.
pub struct PodStateMachine<H: PodHardware, C: MonotonicClock> {
    topology: Topology,
    config: PodConfig,
    hardware: H,
    clock: C,
    telemetry: TelemetryCell,
    overrides: OverrideSlot,

    current: StateId,
    phase_started_us: u64,
    counters: DebounceCounters,
    network: NetworkMonitor,
    crawl_retro_reference: i32,
    shutdown: ShutdownSequencer,
    tick_count: u64,
    last_fault_causes: FaultCause,
}

impl<H: PodHardware, C: MonotonicClock> PodStateMachine<H, C> {
    /// Create a machine in `idle`. The phase timer starts now.
    pub fn new(
        topology: Topology,
        config: PodConfig,
        hardware: H,
        clock: C,
        telemetry: TelemetryCell,
        overrides: OverrideSlot,
    ) -> Self {
        let shutdown = ShutdownSequencer::new(&config.shutdown);
        let phase_started_us = clock.now_us();
        Self {
            topology,
            config,
            hardware,
            clock,
            telemetry,
            overrides,
            current: StateId::Idle,
            phase_started_us,
            counters: DebounceCounters::default(),
            network: NetworkMonitor::default(),
            crawl_retro_reference: 0,
            shutdown,
            tick_count: 0,
            last_fault_causes: FaultCause::empty(),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn current(&self) -> StateId {
        self.current
    }

    /// Canonical name of the current state.
    #[inline]
    pub fn current_name(&self) -> &'static str {
        self.current.name()
    }

    /// Telemetry code of the current state.
    #[inline]
    pub fn state_code(&self) -> u8 {
        self.current.code()
    }

    #[inline]
    pub fn counters(&self) -> &DebounceCounters {
        &self.counters
    }

    #[inline]
    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    #[inline]
    pub fn shutdown(&self) -> &ShutdownSequencer {
        &self.shutdown
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn config(&self) -> &PodConfig {
        &self.config
    }

    #[inline]
    pub fn telemetry(&self) -> &TelemetryCell {
        &self.telemetry
    }

    #[inline]
    pub fn overrides(&self) -> &OverrideSlot {
        &self.overrides
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Causes behind the most recent fault route.
    #[inline]
    pub fn last_fault_causes(&self) -> FaultCause {
        self.last_fault_causes
    }

    #[inline]
    pub fn crawl_retro_reference(&self) -> i32 {
        self.crawl_retro_reference
    }

    /// Time spent in the current state [µs].
    pub fn phase_elapsed_us(&self) -> u64 {
        self.clock.now_us().saturating_sub(self.phase_started_us)
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one control cycle.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_count += 1;
        let now_us = self.clock.now_us();

        if let Some(name) = self.overrides.take() {
            return self.apply_override(&name, now_us);
        }

        let snapshot = self.telemetry.snapshot();
        let from = self.current;
        let mut ctx = GuardContext {
            snapshot: &snapshot,
            now_us,
            elapsed_us: now_us.saturating_sub(self.phase_started_us),
            config: &self.config,
            counters: &mut self.counters,
            network: &mut self.network,
            hardware: &mut self.hardware,
            crawl_retro_reference: self.crawl_retro_reference,
            shutdown: &mut self.shutdown,
            telemetry: &self.telemetry,
            causes: FaultCause::empty(),
        };
        let verdict = guard::evaluate(from, &mut ctx);
        let causes = ctx.causes;

        let Some(transition) = self.resolve(from, verdict) else {
            return TickOutcome::Stayed;
        };

        if transition.target.is_fault() {
            self.last_fault_causes = causes;
            warn!(from = %from, to = %transition.target, ?causes, "Fault route");
        }

        if transition.action.execute(&mut self.hardware) {
            info!(from = %from, to = %transition.target, "State transition");
            self.enter(transition.target, now_us, &snapshot);
            TickOutcome::Transitioned {
                from,
                to: transition.target,
            }
        } else {
            let to = self.topology.find_fault_state(from);
            self.last_fault_causes = causes | FaultCause::TRANSITION_FAILED;
            warn!(
                from = %from,
                attempted = %transition.target,
                to = %to,
                "Transition action failed, rerouting to fault"
            );
            self.enter(to, now_us, &snapshot);
            TickOutcome::Rerouted {
                from,
                attempted: transition.target,
                to,
            }
        }
    }

    /// Map a verdict onto an edge of `from`.
    ///
    /// A verdict naming a missing edge is routed to the fault edge.
    fn resolve(&self, from: StateId, verdict: Verdict) -> Option<Transition> {
        let requested = match verdict {
            Verdict::Stay => return None,
            Verdict::Fault => return self.topology.fault_transition(from),
            Verdict::Next => self.topology.next_transition(from),
            Verdict::To(target) => self.topology.find_transition(from, target),
        };
        requested.or_else(|| {
            error!(state = %from, ?verdict, "Guard requested a missing edge");
            self.topology.fault_transition(from)
        })
    }

    fn apply_override(&mut self, name: &str, now_us: u64) -> TickOutcome {
        let Some(target) = self.topology.find_state(name) else {
            warn!(request = name, "Override names no known state, ignored");
            return TickOutcome::OverrideIgnored;
        };

        let from = self.current;
        if let Some(edge) = self.topology.find_transition(from, target) {
            let accepted = edge.action.execute(&mut self.hardware);
            debug!(accepted, "Override edge action");
        }

        info!(from = %from, to = %target, "Override applied");
        let snapshot = self.telemetry.snapshot();
        self.enter(target, now_us, &snapshot);
        TickOutcome::Overridden { from, to: target }
    }

    /// Entry action of `state`.
    fn enter(&mut self, state: StateId, now_us: u64, snapshot: &TelemetrySnapshot) {
        let from = self.current;
        self.current = state;
        self.phase_started_us = now_us;

        if self.config.policy.reset_debounce_on_entry {
            self.counters.reset();
        }

        match state {
            StateId::Crawl => {
                self.crawl_retro_reference = snapshot.motion.retro_count;
                debug!(reference = self.crawl_retro_reference, "Crawl retro reference latched");
            }
            // Moving between fault states keeps the persistence count.
            StateId::RunFault | StateId::NonRunFault if !from.is_fault() => self.shutdown.reset(),
            _ => {}
        }

        info!(state = %state, code = state.code(), "Entered state");
    }
}
