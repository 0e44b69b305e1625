//! Pod operating states.
//!
//! The set of states is closed: every state the control unit can be in is a
//! variant of [`StateId`], and every lookup table in the workspace is indexed
//! by `StateId as usize`. Names are only used at the edges (operator override
//! requests, logs, telemetry).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::consts::FAULT_NAME_PREFIX;

/// Pod operating state.
///
/// Discriminants are table indices (build order), not telemetry codes;
/// see [`StateId::code`] for the value published to dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StateId {
    /// Powered, waiting for the operator.
    #[serde(rename = "idle")]
    Idle = 0,
    /// Tube evacuation in progress.
    #[serde(rename = "pumpdown")]
    Pumpdown = 1,
    /// Motor driving the pod.
    #[serde(rename = "propulsion")]
    Propulsion = 2,
    /// Brakes actuated, decelerating.
    #[serde(rename = "braking")]
    Braking = 3,
    /// HV precharge for servicing.
    #[serde(rename = "servicing-precharge")]
    ServicingPrecharge = 4,
    /// Low-speed crawl to the tube end.
    #[serde(rename = "crawl")]
    Crawl = 5,
    /// Pod at rest after braking.
    #[serde(rename = "stopped")]
    Stopped = 6,
    /// Run finished, systems winding down.
    #[serde(rename = "post-run")]
    PostRun = 7,
    /// Pressures verified, crew may approach.
    #[serde(rename = "safe-to-approach")]
    SafeToApproach = 8,
    /// Fault outside of a run. Exits only via operator override.
    #[serde(rename = "fault-non-run")]
    NonRunFault = 9,
    /// Fault during a run. Exits only via operator override.
    #[serde(rename = "fault-run")]
    RunFault = 10,
}

impl StateId {
    /// Number of states.
    pub const COUNT: usize = 11;

    /// All states in table order.
    pub const ALL: [StateId; Self::COUNT] = [
        Self::Idle,
        Self::Pumpdown,
        Self::Propulsion,
        Self::Braking,
        Self::ServicingPrecharge,
        Self::Crawl,
        Self::Stopped,
        Self::PostRun,
        Self::SafeToApproach,
        Self::NonRunFault,
        Self::RunFault,
    ];

    /// Convert from raw `u8` table index. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Pumpdown),
            2 => Some(Self::Propulsion),
            3 => Some(Self::Braking),
            4 => Some(Self::ServicingPrecharge),
            5 => Some(Self::Crawl),
            6 => Some(Self::Stopped),
            7 => Some(Self::PostRun),
            8 => Some(Self::SafeToApproach),
            9 => Some(Self::NonRunFault),
            10 => Some(Self::RunFault),
            _ => None,
        }
    }

    /// Table index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical state name, as accepted by override requests.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pumpdown => "pumpdown",
            Self::Propulsion => "propulsion",
            Self::Braking => "braking",
            Self::ServicingPrecharge => "servicing-precharge",
            Self::Crawl => "crawl",
            Self::Stopped => "stopped",
            Self::PostRun => "post-run",
            Self::SafeToApproach => "safe-to-approach",
            Self::NonRunFault => "fault-non-run",
            Self::RunFault => "fault-run",
        }
    }

    /// Numeric state code published to telemetry and the dashboard.
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 1,
            Self::Pumpdown => 2,
            Self::Propulsion => 3,
            Self::Braking => 4,
            Self::Stopped => 5,
            Self::ServicingPrecharge => 6,
            Self::Crawl => 7,
            Self::PostRun => 8,
            Self::SafeToApproach => 9,
            Self::NonRunFault => 10,
            Self::RunFault => 11,
        }
    }

    /// Whether this is one of the two fault states.
    #[inline]
    pub const fn is_fault(self) -> bool {
        matches!(self, Self::NonRunFault | Self::RunFault)
    }

    /// Resolve a state by name.
    ///
    /// Matching is ASCII case-insensitive and also accepts `_` in place of
    /// `-` plus the legacy fault spellings (`run-fault`, `non-run-fault`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| names_match(s.name(), name))
            .or_else(|| match_alias(name))
    }
}

fn names_match(canonical: &str, candidate: &str) -> bool {
    canonical.len() == candidate.len()
        && canonical
            .bytes()
            .zip(candidate.bytes())
            .all(|(a, b)| a == normalize(b))
}

#[inline]
fn normalize(b: u8) -> u8 {
    if b == b'_' { b'-' } else { b.to_ascii_lowercase() }
}

fn match_alias(name: &str) -> Option<StateId> {
    if names_match("run-fault", name) {
        Some(StateId::RunFault)
    } else if names_match("non-run-fault", name) {
        Some(StateId::NonRunFault)
    } else {
        None
    }
}

const_assert_eq!(StateId::COUNT, StateId::RunFault as usize + 1);

impl Default for StateId {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a state name cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state name '{0}'")]
pub struct StateNameError(pub String);

impl FromStr for StateId {
    type Err = StateNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| StateNameError(s.to_string()))
    }
}

/// Whether `name` carries the fault-state prefix.
#[inline]
pub fn is_fault_name(name: &str) -> bool {
    name.starts_with(FAULT_NAME_PREFIX)
}
