//! Staged fault shutdown for the two fault states.
//!
//! Ticked once per cycle while the pod sits in `fault-run` or
//! `fault-non-run`. A persistence counter increments every tick; when it
//! reaches the configured threshold it resets to zero and arms the ordered
//! sequence for the current fault state.
//!
//! `fault-non-run` winds the drive down before removing HV:
//!
//! 1. clear motor enable
//! 2. command no torque
//! 3. command discharge
//! 4. disable inverter
//! 5. drop HV enable
//!
//! `fault-run` drops HV enable first, then runs steps 1 to 4.
//!
//! Consecutive steps are separated by a settling delay scheduled against the
//! monotonic clock. A step fires on the first tick at or after its due time;
//! nothing ever sleeps. Step failures are logged and the sequence carries on,
//! so a stuck actuator cannot hold back the ones after it. The order is fixed
//! when the sequence is armed.

use tracing::{debug, info, warn};

use pod_common::config::ShutdownConfig;
use pod_common::hardware::PodHardware;
use pod_common::state::StateId;

/// One hardware command in the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownStep {
    ClearMotorEnable = 0,
    NoTorque = 1,
    Discharge = 2,
    DisableInverter = 3,
    DisableHv = 4,
}

/// Steps per sequence.
pub const SHUTDOWN_STEPS: usize = 5;

impl ShutdownStep {
    /// Order used by `fault-non-run`.
    pub const NON_RUN_ORDER: [ShutdownStep; SHUTDOWN_STEPS] = [
        Self::ClearMotorEnable,
        Self::NoTorque,
        Self::Discharge,
        Self::DisableInverter,
        Self::DisableHv,
    ];

    /// Order used by `fault-run`.
    pub const RUN_ORDER: [ShutdownStep; SHUTDOWN_STEPS] = [
        Self::DisableHv,
        Self::ClearMotorEnable,
        Self::NoTorque,
        Self::Discharge,
        Self::DisableInverter,
    ];

    /// Sequence run while sitting in `state`.
    pub const fn order_for(state: StateId) -> &'static [ShutdownStep; SHUTDOWN_STEPS] {
        match state {
            StateId::RunFault => &Self::RUN_ORDER,
            _ => &Self::NON_RUN_ORDER,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::ClearMotorEnable => "clear-motor-enable",
            Self::NoTorque => "no-torque",
            Self::Discharge => "discharge",
            Self::DisableInverter => "disable-inverter",
            Self::DisableHv => "disable-hv",
        }
    }

    /// Issue the hardware command.
    pub fn apply(self, hardware: &mut dyn PodHardware) -> bool {
        match self {
            Self::ClearMotorEnable => hardware.clear_motor_enable(),
            Self::NoTorque => hardware.command_no_torque(),
            Self::Discharge => hardware.command_discharge(),
            Self::DisableInverter => hardware.disable_inverter(),
            Self::DisableHv => hardware.set_hv_enable(false),
        }
    }
}

/// Sequencer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Counting ticks toward the next sequence.
    Counting,
    /// Sequence armed; `order[next]` fires at or after `due_us`.
    Sequencing {
        order: &'static [ShutdownStep; SHUTDOWN_STEPS],
        next: u8,
        due_us: u64,
    },
}

/// Non-blocking shutdown sequencer.
#[derive(Debug, Clone)]
pub struct ShutdownSequencer {
    persistence_ticks: u32,
    settle_us: u64,
    counter: u32,
    phase: ShutdownPhase,
    /// Sequences started since the last reset.
    sequences: u64,
    /// Step failures since the last reset.
    failures: u64,
}

impl ShutdownSequencer {
    pub fn new(config: &ShutdownConfig) -> Self {
        Self {
            persistence_ticks: config.persistence_ticks,
            settle_us: config.settle_us,
            counter: 0,
            phase: ShutdownPhase::Counting,
            sequences: 0,
            failures: 0,
        }
    }

    /// Persistence counter value (0 right after a sequence starts).
    #[inline]
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    #[inline]
    pub const fn phase(&self) -> ShutdownPhase {
        self.phase
    }

    #[inline]
    pub const fn sequences_started(&self) -> u64 {
        self.sequences
    }

    #[inline]
    pub const fn step_failures(&self) -> u64 {
        self.failures
    }

    /// Whether a sequence still has steps pending.
    #[inline]
    pub const fn is_sequencing(&self) -> bool {
        matches!(self.phase, ShutdownPhase::Sequencing { .. })
    }

    /// Back to a fresh count. Called when a fault state is entered from an
    /// operating state.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.phase = ShutdownPhase::Counting;
        self.sequences = 0;
        self.failures = 0;
    }

    /// Advance one tick in fault state `state`. Returns the number of steps
    /// issued this tick.
    pub fn tick(&mut self, state: StateId, now_us: u64, hardware: &mut dyn PodHardware) -> usize {
        self.counter = self.counter.saturating_add(1);
        if self.counter >= self.persistence_ticks {
            self.counter = 0;
            self.sequences += 1;
            if self.is_sequencing() {
                warn!("Shutdown sequence restarted before completion");
            }
            info!(
                sequence = self.sequences,
                state = %state,
                "Fault persisted, starting staged shutdown"
            );
            self.phase = ShutdownPhase::Sequencing {
                order: ShutdownStep::order_for(state),
                next: 0,
                due_us: now_us,
            };
        }

        let mut issued = 0;
        while let ShutdownPhase::Sequencing {
            order,
            next,
            due_us,
        } = self.phase
        {
            if now_us < due_us {
                break;
            }
            let step = order[next as usize];
            if step.apply(hardware) {
                debug!(step = step.name(), "Shutdown step issued");
            } else {
                self.failures += 1;
                warn!(step = step.name(), "Shutdown step rejected by hardware");
            }
            issued += 1;

            let following = next as usize + 1;
            self.phase = if following < SHUTDOWN_STEPS {
                ShutdownPhase::Sequencing {
                    order,
                    next: following as u8,
                    due_us: now_us.saturating_add(self.settle_us),
                }
            } else {
                ShutdownPhase::Counting
            };
        }
        issued
    }
}
