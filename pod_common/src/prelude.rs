//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use pod_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use pod_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    Band, ConfigError, ConfigLoader, CycleConfig, FaultPolicy, PhaseTiming, PodConfig,
    PressureEnvelope, SharedConfig, ShutdownConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, DEBOUNCE_THRESHOLD, NETWORK_LOSS_THRESHOLD};

// ─── State & Faults ─────────────────────────────────────────────────
pub use crate::fault::{CheckPhase, FaultCause, Subsystem, SubsystemHealth};
pub use crate::state::StateId;

// ─── Capabilities ───────────────────────────────────────────────────
pub use crate::clock::{ManualClock, MonotonicClock, SystemClock};
pub use crate::hardware::{PodHardware, Transport};

// ─── Data Exchange ──────────────────────────────────────────────────
pub use crate::command::{CommandError, OverrideSlot};
pub use crate::telemetry::{TelemetryCell, TelemetrySnapshot};
