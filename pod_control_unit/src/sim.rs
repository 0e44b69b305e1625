//! Simulation backend: recorded hardware, telemetry feed, operator console.
//!
//! Lets the control unit run (and be tested) without pod hardware.
//! [`SimulatedHardware`] accepts every command, keeps the most recent ones
//! in a fixed-size window, and exposes knobs for IMD status, link health and
//! a refusing inverter.
//! [`spawn_telemetry_feed`] republishes nominal sensor readings from a
//! background thread. [`OperatorInput::parse`] turns console lines into
//! override requests or telemetry flag changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use heapless::Deque;
use tracing::{debug, info, warn};

use pod_common::command::OverrideSlot;
use pod_common::hardware::{PodHardware, Transport};
use pod_common::telemetry::{PressureReadings, TelemetryCell};

// ─── Simulated Hardware ─────────────────────────────────────────────

/// Hardware command observed by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    ClearMotorEnable,
    NoTorque,
    Discharge,
    DisableInverter,
    HvEnable(bool),
}

/// Actuations kept by [`SimulatedHardware`]; older ones are dropped.
pub const ACTUATION_LOG_CAPACITY: usize = 64;

#[derive(Debug)]
struct SimState {
    imd_ok: bool,
    udp_ok: bool,
    tcp_ok: bool,
    no_torque_fails: bool,
    motor_enabled: bool,
    hv_enabled: bool,
    actuations: Deque<Actuation, ACTUATION_LOG_CAPACITY>,
    actuation_total: u64,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            imd_ok: true,
            udp_ok: true,
            tcp_ok: true,
            no_torque_fails: false,
            motor_enabled: true,
            hv_enabled: true,
            actuations: Deque::new(),
            actuation_total: 0,
        }
    }
}

/// In-memory pod hardware. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_imd_ok(&self, ok: bool) {
        self.lock().imd_ok = ok;
    }

    pub fn set_link(&self, transport: Transport, ok: bool) {
        let mut s = self.lock();
        match transport {
            Transport::Udp => s.udp_ok = ok,
            Transport::Tcp => s.tcp_ok = ok,
        }
    }

    /// Make the inverter refuse no-torque commands.
    pub fn set_no_torque_fails(&self, fails: bool) {
        self.lock().no_torque_fails = fails;
    }

    /// Most recent commands, oldest first.
    pub fn actuations(&self) -> Vec<Actuation> {
        self.lock().actuations.iter().copied().collect()
    }

    /// Commands issued since creation, including those dropped from the window.
    pub fn actuation_total(&self) -> u64 {
        self.lock().actuation_total
    }

    pub fn clear_actuations(&self) {
        self.lock().actuations.clear();
    }

    pub fn motor_enabled(&self) -> bool {
        self.lock().motor_enabled
    }

    pub fn hv_enabled(&self) -> bool {
        self.lock().hv_enabled
    }

    fn record(&self, actuation: Actuation) {
        debug!(?actuation, "sim actuation");
        let mut s = self.lock();
        if s.actuations.is_full() {
            s.actuations.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = s.actuations.push_back(actuation);
        s.actuation_total += 1;
    }
}

impl PodHardware for SimulatedHardware {
    fn clear_motor_enable(&mut self) -> bool {
        self.record(Actuation::ClearMotorEnable);
        self.lock().motor_enabled = false;
        true
    }

    fn command_no_torque(&mut self) -> bool {
        self.record(Actuation::NoTorque);
        !self.lock().no_torque_fails
    }

    fn command_discharge(&mut self) -> bool {
        self.record(Actuation::Discharge);
        true
    }

    fn disable_inverter(&mut self) -> bool {
        self.record(Actuation::DisableInverter);
        true
    }

    fn set_hv_enable(&mut self, enabled: bool) -> bool {
        self.record(Actuation::HvEnable(enabled));
        self.lock().hv_enabled = enabled;
        true
    }

    fn imd_ok(&self) -> bool {
        self.lock().imd_ok
    }

    fn link_ok(&self, transport: Transport) -> bool {
        let s = self.lock();
        match transport {
            Transport::Udp => s.udp_ok,
            Transport::Tcp => s.tcp_ok,
        }
    }
}

// ─── Telemetry Feed ─────────────────────────────────────────────────

/// Republish nominal pressures every `period` until `running` drops.
///
/// Only pressure channels are written; flags, motion and health stay under
/// operator control.
pub fn spawn_telemetry_feed(
    cell: TelemetryCell,
    running: Arc<AtomicBool>,
    period: Duration,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("telemetry-feed".into())
        .spawn(move || {
            while running.load(Ordering::Relaxed) {
                cell.publish(|s| s.pressure = PressureReadings::nominal());
                thread::sleep(period);
            }
            debug!("Telemetry feed stopped");
        })
}

// ─── Operator Console ───────────────────────────────────────────────

/// Telemetry flag the console can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFlag {
    EmergencyBrake,
    ShouldStop,
    ReadyToBrake,
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorInput {
    /// Blank line.
    Empty,
    /// Anything not prefixed with `:` is an override request.
    Override(String),
    /// `:ebrake on`, `:stop off`, `:ready on`.
    Flag(OperatorFlag, bool),
    /// `:retro <n>`.
    Retro(i32),
    /// Malformed `:` command.
    Invalid(String),
}

impl OperatorInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Override(line.to_string());
        };

        let mut words = command.split_whitespace();
        let (Some(verb), arg, None) = (words.next(), words.next(), words.next()) else {
            return Self::Invalid(line.to_string());
        };

        let flag = match verb {
            "ebrake" => Some(OperatorFlag::EmergencyBrake),
            "stop" => Some(OperatorFlag::ShouldStop),
            "ready" => Some(OperatorFlag::ReadyToBrake),
            _ => None,
        };

        match (flag, verb, arg) {
            (Some(flag), _, Some("on")) => Self::Flag(flag, true),
            (Some(flag), _, Some("off")) => Self::Flag(flag, false),
            (None, "retro", Some(n)) => n
                .parse()
                .map(Self::Retro)
                .unwrap_or_else(|_| Self::Invalid(line.to_string())),
            _ => Self::Invalid(line.to_string()),
        }
    }

    /// Route the input to the override slot or the telemetry cell.
    pub fn apply(self, overrides: &OverrideSlot, telemetry: &TelemetryCell) {
        match self {
            Self::Empty => {}
            Self::Override(name) => match overrides.request(&name) {
                Ok(()) => info!(request = %name, "Override requested"),
                Err(e) => warn!("Override rejected: {e}"),
            },
            Self::Flag(flag, on) => telemetry.publish(|s| match flag {
                OperatorFlag::EmergencyBrake => s.flags.emergency_brake = on,
                OperatorFlag::ShouldStop => s.flags.should_stop = on,
                OperatorFlag::ReadyToBrake => s.flags.ready_to_brake = on,
            }),
            Self::Retro(n) => telemetry.publish(|s| s.motion.retro_count = n),
            Self::Invalid(line) => warn!(%line, "Unrecognised console command"),
        }
    }
}
