//! Fault predicate types shared between acquisition and the control unit.
//!
//! Acquisition threads (pressure sampling, BMS/RMS CAN decoding) evaluate
//! each subsystem against the envelope of every check phase and publish the
//! set of phases that currently FAIL. The control unit only asks "does this
//! subsystem pass for this phase right now".

use bitflags::bitflags;

bitflags! {
    /// Operating phase a subsystem envelope is evaluated for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CheckPhase: u8 {
        /// Before the run: pumpdown, servicing.
        const PRERUN  = 0x01;
        /// Propulsion.
        const RUN     = 0x02;
        /// Braking (and stopped, for pressure and battery).
        const BRAKING = 0x04;
        /// Stopped (motor controller).
        const STOPPED = 0x08;
        /// Crawl.
        const CRAWL   = 0x10;
        /// Post-run.
        const POSTRUN = 0x20;
    }
}

impl Default for CheckPhase {
    fn default() -> Self {
        Self::empty()
    }
}

/// Subsystem covered by a debounced check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Brake pneumatics and pressure vessel.
    Pressure,
    /// BMS (battery pack).
    Battery,
    /// RMS (motor controller / inverter).
    Rms,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Self::Pressure, Self::Battery, Self::Rms];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::Battery => "battery",
            Self::Rms => "rms",
        }
    }
}

/// Per-subsystem set of check phases that are currently failing.
///
/// The default (no failing phases) means every predicate passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsystemHealth {
    pub pressure_failing: CheckPhase,
    pub battery_failing: CheckPhase,
    pub rms_failing: CheckPhase,
}

impl SubsystemHealth {
    /// All predicates pass.
    pub const fn healthy() -> Self {
        Self {
            pressure_failing: CheckPhase::empty(),
            battery_failing: CheckPhase::empty(),
            rms_failing: CheckPhase::empty(),
        }
    }

    /// Whether `subsystem` is within its envelope for `phase`.
    #[inline]
    pub fn passes(&self, subsystem: Subsystem, phase: CheckPhase) -> bool {
        !self.failing(subsystem).intersects(phase)
    }

    #[inline]
    pub fn failing(&self, subsystem: Subsystem) -> CheckPhase {
        match subsystem {
            Subsystem::Pressure => self.pressure_failing,
            Subsystem::Battery => self.battery_failing,
            Subsystem::Rms => self.rms_failing,
        }
    }

    /// Mark `subsystem` as failing (`true`) or passing for `phases`.
    pub fn set_failing(&mut self, subsystem: Subsystem, phases: CheckPhase, failing: bool) {
        let slot = match subsystem {
            Subsystem::Pressure => &mut self.pressure_failing,
            Subsystem::Battery => &mut self.battery_failing,
            Subsystem::Rms => &mut self.rms_failing,
        };
        slot.set(phases, failing);
    }
}

bitflags! {
    /// Why a fault route fired. Recorded per tick for diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultCause: u16 {
        /// Operator emergency-brake flag.
        const EMERGENCY_BRAKE   = 0x0001;
        /// Insulation monitoring device reports an isolation fault.
        const IMD               = 0x0002;
        /// Confirmed loss of a network transport.
        const NETWORK_LOSS      = 0x0004;
        /// Pressure debounce threshold reached.
        const PRESSURE          = 0x0008;
        /// Battery debounce threshold reached.
        const BATTERY           = 0x0010;
        /// Motor-controller debounce threshold reached.
        const RMS               = 0x0020;
        /// Pumpdown exceeded its hard timeout.
        const PUMPDOWN_TIMEOUT  = 0x0040;
        /// Immediate (non-debounced) pressure failure.
        const PRESSURE_IMMEDIATE = 0x0080;
        /// Pressure channel outside the safe-to-approach envelope.
        const ENVELOPE          = 0x0100;
        /// A transition action reported failure.
        const TRANSITION_FAILED = 0x0200;
    }
}

impl FaultCause {
    /// Causes that bypass debouncing.
    pub const IMMEDIATE_MASK: Self = Self::from_bits_truncate(
        Self::EMERGENCY_BRAKE.bits()
            | Self::IMD.bits()
            | Self::NETWORK_LOSS.bits()
            | Self::PRESSURE_IMMEDIATE.bits()
            | Self::ENVELOPE.bits(),
    );

    #[inline]
    pub const fn is_immediate(&self) -> bool {
        self.intersects(Self::IMMEDIATE_MASK)
    }

    /// Debounce cause for a subsystem.
    pub const fn debounced(subsystem: Subsystem) -> Self {
        match subsystem {
            Subsystem::Pressure => Self::PRESSURE,
            Subsystem::Battery => Self::BATTERY,
            Subsystem::Rms => Self::RMS,
        }
    }
}

impl Default for FaultCause {
    fn default() -> Self {
        Self::empty()
    }
}
