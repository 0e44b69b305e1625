//! Shared harness for the integration tests.

mod config_loading;
mod fault_containment;
mod lifecycle;
mod override_path;
mod safe_to_approach;

use pod_common::clock::ManualClock;
use pod_common::command::OverrideSlot;
use pod_common::config::PodConfig;
use pod_common::state::StateId;
use pod_common::telemetry::{TelemetryCell, TelemetrySnapshot};
use pod_control_unit::machine::{PodStateMachine, TickOutcome};
use pod_control_unit::sim::SimulatedHardware;
use pod_control_unit::topology::Topology;

/// Control cycle used by the harness [µs].
pub const TICK_US: u64 = 10_000;

/// Machine plus handles to everything it consumes.
pub struct Pod {
    pub machine: PodStateMachine<SimulatedHardware, ManualClock>,
    pub hardware: SimulatedHardware,
    pub clock: ManualClock,
    pub telemetry: TelemetryCell,
    pub overrides: OverrideSlot,
}

impl Pod {
    pub fn new() -> Self {
        Self::with_config(PodConfig::with_service_name("integration"))
    }

    pub fn with_config(config: PodConfig) -> Self {
        let hardware = SimulatedHardware::new();
        let clock = ManualClock::new(1_000_000);
        let telemetry = TelemetryCell::default();
        let overrides = OverrideSlot::new();
        let machine = PodStateMachine::new(
            Topology::build().expect("topology"),
            config,
            hardware.clone(),
            clock.clone(),
            telemetry.clone(),
            overrides.clone(),
        );
        Self {
            machine,
            hardware,
            clock,
            telemetry,
            overrides,
        }
    }

    /// Advance the clock one cycle, then tick.
    pub fn step(&mut self) -> TickOutcome {
        self.clock.advance(TICK_US);
        self.machine.tick()
    }

    /// Step `n` cycles; panics if the state changes.
    pub fn hold(&mut self, n: usize) {
        for i in 0..n {
            let outcome = self.step();
            assert_eq!(
                outcome,
                TickOutcome::Stayed,
                "tick {i} in {} left the state",
                self.machine.current()
            );
        }
    }

    /// Request an override and apply it on the next tick.
    pub fn force(&mut self, state: StateId) {
        self.overrides.request(state.name()).expect("override");
        let outcome = self.step();
        assert_eq!(
            outcome.entered(),
            Some(state),
            "override to {state} not applied: {outcome:?}"
        );
    }

    pub fn publish(&self, update: impl FnOnce(&mut TelemetrySnapshot)) {
        self.telemetry.publish(update);
    }

    pub fn state(&self) -> StateId {
        self.machine.current()
    }
}
