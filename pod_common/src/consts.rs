//! System-wide constants for the pod workspace.
//!
//! Single source of truth for numeric limits and policy defaults.
//! Config defaults in [`crate::config`] resolve to these values.

use static_assertions::const_assert;

/// Default control-loop cycle time in microseconds (100 Hz).
pub const CYCLE_TIME_US: u32 = 10_000;

/// Minimum accepted cycle time [µs].
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Maximum accepted cycle time [µs].
pub const CYCLE_TIME_US_MAX: u32 = 1_000_000;

/// Consecutive failing checks that promote a transient fault to a transition.
pub const DEBOUNCE_THRESHOLD: u32 = 10;

/// Consecutive link-down samples before network loss is confirmed.
pub const NETWORK_LOSS_THRESHOLD: u32 = 500;

/// Retro markers counted before propulsion may hand over to braking.
pub const BRAKING_RETRO_THRESHOLD: i32 = 3;

/// Retro markers crawl must advance past its entry reference to finish.
pub const CRAWL_RETRO_ADVANCE: i32 = 2;

/// Pumpdown hard timeout [µs].
pub const PUMPDOWN_TIMEOUT_US: u64 = 300_000_000;

/// Propulsion run-time limit before braking is forced [µs].
pub const PROPULSION_TIMEOUT_US: u64 = 30_000_000;

/// Braking: pressure checks start after this delay [µs].
pub const BRAKING_PRESSURE_DELAY_US: u64 = 5_000_000;

/// Braking: motor-controller checks start after this delay [µs].
pub const BRAKING_RMS_DELAY_US: u64 = 10_000_000;

/// Braking: unconditional hand-over to stopped [µs].
pub const BRAKING_COMPLETE_US: u64 = 15_000_000;

/// Crawl timeout before post-run [µs].
pub const CRAWL_TIMEOUT_US: u64 = 5_000_000;

/// Fault-state ticks between staged shutdown sequences.
pub const SHUTDOWN_PERSISTENCE_TICKS: u32 = 50;

/// Settling delay between staged shutdown steps [µs].
pub const SHUTDOWN_SETTLE_US: u64 = 1_000;

/// Capacity of an override request name (bytes).
pub const OVERRIDE_NAME_CAPACITY: usize = 24;

/// Prefix shared by the names of both fault states.
pub const FAULT_NAME_PREFIX: &str = "fault";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/pod.toml";

// ─── Compile-time checks ────────────────────────────────────────────

const_assert!(CYCLE_TIME_US >= CYCLE_TIME_US_MIN && CYCLE_TIME_US <= CYCLE_TIME_US_MAX);
const_assert!(DEBOUNCE_THRESHOLD > 0);
const_assert!(NETWORK_LOSS_THRESHOLD > 0);
const_assert!(SHUTDOWN_PERSISTENCE_TICKS > 0);
const_assert!(BRAKING_PRESSURE_DELAY_US < BRAKING_RMS_DELAY_US);
const_assert!(BRAKING_RMS_DELAY_US <= BRAKING_COMPLETE_US);
const_assert!(CRAWL_RETRO_ADVANCE > 0);
