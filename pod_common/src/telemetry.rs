//! Telemetry snapshot consumed by the control unit.
//!
//! Acquisition threads publish into a [`TelemetryCell`]; the control unit
//! copies the whole [`TelemetrySnapshot`] out once per tick so every guard
//! evaluation within that tick sees one self-consistent view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::fault::SubsystemHealth;

/// Brake pneumatics and pressure-vessel readings [psi].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PressureReadings {
    pub primary_tank: f64,
    pub primary_line: f64,
    pub primary_actuator: f64,
    pub secondary_tank: f64,
    pub secondary_line: f64,
    pub secondary_actuator: f64,
    pub ambient: f64,
    pub pressure_vessel: f64,
}

impl PressureReadings {
    /// Readings in the middle of every safe-to-approach band.
    pub const fn nominal() -> Self {
        Self {
            primary_tank: 0.0,
            primary_line: 0.0,
            primary_actuator: 0.0,
            secondary_tank: 0.0,
            secondary_line: 0.0,
            secondary_actuator: 0.0,
            ambient: 14.7,
            pressure_vessel: 15.0,
        }
    }
}

/// Motion estimate. Metric units, positive X along the tube.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionReadings {
    /// Position [m].
    pub position: f64,
    /// Velocity [m/s].
    pub velocity: f64,
    /// Acceleration [m/s²].
    pub acceleration: f64,
    /// Retro-reflective track markers counted since the run started.
    pub retro_count: i32,
}

/// Operator and run-control flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryFlags {
    pub emergency_brake: bool,
    pub should_stop: bool,
    pub ready_to_brake: bool,
}

/// Point-in-time copy of everything the guards read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub pressure: PressureReadings,
    pub motion: MotionReadings,
    pub health: SubsystemHealth,
    pub flags: TelemetryFlags,
    /// Incremented on every publish.
    pub sequence: u64,
}

impl TelemetrySnapshot {
    /// All subsystems healthy, pressures nominal, pod at rest.
    pub const fn nominal() -> Self {
        Self {
            pressure: PressureReadings::nominal(),
            motion: MotionReadings {
                position: 0.0,
                velocity: 0.0,
                acceleration: 0.0,
                retro_count: 0,
            },
            health: SubsystemHealth::healthy(),
            flags: TelemetryFlags {
                emergency_brake: false,
                should_stop: false,
                ready_to_brake: false,
            },
            sequence: 0,
        }
    }
}

/// Shared, lock-protected telemetry.
///
/// Cloning yields another handle to the same snapshot. Writers hold the lock
/// only while mutating; the reader copies the snapshot out.
#[derive(Debug, Clone)]
pub struct TelemetryCell {
    inner: Arc<Mutex<TelemetrySnapshot>>,
}

impl TelemetryCell {
    pub fn new(initial: TelemetrySnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TelemetrySnapshot> {
        // A panicked writer leaves plain-old-data behind; keep reading it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the snapshot under the lock and bump its sequence number.
    pub fn publish<F>(&self, update: F)
    where
        F: FnOnce(&mut TelemetrySnapshot),
    {
        let mut guard = self.lock();
        update(&mut guard);
        guard.sequence = guard.sequence.wrapping_add(1);
    }

    /// Copy out the current snapshot.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        *self.lock()
    }

    /// Acknowledge the emergency-brake flag (fault states own the brake).
    pub fn clear_emergency_brake(&self) {
        self.publish(|s| s.flags.emergency_brake = false);
    }
}

impl Default for TelemetryCell {
    fn default() -> Self {
        Self::new(TelemetrySnapshot::nominal())
    }
}
