//! Configuration loading traits and types.
//!
//! The control unit reads one TOML file at startup. Every section except
//! `[shared]` is optional and every field falls back to the defaults in
//! [`crate::consts`], so a minimal file only names the service.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "pod-cu-01"
//!
//! [timing]
//! braking_complete_us = 15000000
//!
//! [envelope.pressure_vessel]
//! min = 13.0
//! max = 20.0
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use pod_common::config::{ConfigError, PodConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PodConfig::load_validated(Path::new("config/pod.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    BRAKING_COMPLETE_US, BRAKING_PRESSURE_DELAY_US, BRAKING_RETRO_THRESHOLD, BRAKING_RMS_DELAY_US,
    CRAWL_RETRO_ADVANCE, CRAWL_TIMEOUT_US, CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN,
    DEBOUNCE_THRESHOLD, NETWORK_LOSS_THRESHOLD, PROPULSION_TIMEOUT_US, PUMPDOWN_TIMEOUT_US,
    SHUTDOWN_PERSISTENCE_TICKS, SHUTDOWN_SETTLE_US,
};
use crate::telemetry::PressureReadings;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Pod Config ─────────────────────────────────────────────────────

/// Top-level control unit configuration.
///
/// Loaded once at startup; immutable while the control loop runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub policy: FaultPolicy,
    #[serde(default)]
    pub timing: PhaseTiming,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    #[serde(default)]
    pub envelope: PressureEnvelope,
}

impl PodConfig {
    /// Defaults for every section, with the given service name.
    pub fn with_service_name(name: &str) -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: name.to_string(),
            },
            cycle: CycleConfig::default(),
            policy: FaultPolicy::default(),
            timing: PhaseTiming::default(),
            shutdown: ShutdownConfig::default(),
            envelope: PressureEnvelope::default(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter bounds across all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.cycle.validate().map_err(ConfigError::ValidationError)?;
        self.policy.validate().map_err(ConfigError::ValidationError)?;
        self.timing.validate().map_err(ConfigError::ValidationError)?;
        self.shutdown.validate().map_err(ConfigError::ValidationError)?;
        self.envelope.validate().map_err(ConfigError::ValidationError)?;
        Ok(())
    }
}

/// Control-loop pacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CycleConfig {
    /// Target cycle time [µs].
    pub cycle_time_us: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            ));
        }
        Ok(())
    }
}

/// Debounce, network and navigation thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultPolicy {
    /// Consecutive failing checks before a subsystem fault routes.
    pub debounce_threshold: u32,
    /// Consecutive link-down samples before network loss is confirmed.
    pub network_loss_threshold: u32,
    /// Zero the debounce counters on every state entry.
    ///
    /// Off by default: counters carry across phases.
    pub reset_debounce_on_entry: bool,
    /// Retro count at which propulsion may hand over to braking.
    pub braking_retro_threshold: i32,
    /// Retro markers crawl must advance past its entry reference.
    pub crawl_retro_advance: i32,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            debounce_threshold: DEBOUNCE_THRESHOLD,
            network_loss_threshold: NETWORK_LOSS_THRESHOLD,
            reset_debounce_on_entry: false,
            braking_retro_threshold: BRAKING_RETRO_THRESHOLD,
            crawl_retro_advance: CRAWL_RETRO_ADVANCE,
        }
    }
}

impl FaultPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_threshold == 0 {
            return Err("debounce_threshold must be > 0".to_string());
        }
        if self.network_loss_threshold == 0 {
            return Err("network_loss_threshold must be > 0".to_string());
        }
        if self.braking_retro_threshold <= 0 {
            return Err(format!(
                "braking_retro_threshold {} must be > 0",
                self.braking_retro_threshold
            ));
        }
        if self.crawl_retro_advance <= 0 {
            return Err(format!(
                "crawl_retro_advance {} must be > 0",
                self.crawl_retro_advance
            ));
        }
        Ok(())
    }
}

/// Time boxes per phase [µs], measured from state entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseTiming {
    pub pumpdown_timeout_us: u64,
    pub propulsion_timeout_us: u64,
    pub braking_pressure_delay_us: u64,
    pub braking_rms_delay_us: u64,
    pub braking_complete_us: u64,
    pub crawl_timeout_us: u64,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            pumpdown_timeout_us: PUMPDOWN_TIMEOUT_US,
            propulsion_timeout_us: PROPULSION_TIMEOUT_US,
            braking_pressure_delay_us: BRAKING_PRESSURE_DELAY_US,
            braking_rms_delay_us: BRAKING_RMS_DELAY_US,
            braking_complete_us: BRAKING_COMPLETE_US,
            crawl_timeout_us: CRAWL_TIMEOUT_US,
        }
    }
}

impl PhaseTiming {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("pumpdown_timeout_us", self.pumpdown_timeout_us),
            ("propulsion_timeout_us", self.propulsion_timeout_us),
            ("braking_complete_us", self.braking_complete_us),
            ("crawl_timeout_us", self.crawl_timeout_us),
        ] {
            if value == 0 {
                return Err(format!("{name} must be > 0"));
            }
        }
        if self.braking_pressure_delay_us >= self.braking_rms_delay_us {
            return Err(format!(
                "braking_pressure_delay_us {} must be < braking_rms_delay_us {}",
                self.braking_pressure_delay_us, self.braking_rms_delay_us
            ));
        }
        if self.braking_rms_delay_us > self.braking_complete_us {
            return Err(format!(
                "braking_rms_delay_us {} must be <= braking_complete_us {}",
                self.braking_rms_delay_us, self.braking_complete_us
            ));
        }
        Ok(())
    }
}

/// Staged fault shutdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownConfig {
    /// Fault-state ticks between shutdown sequences.
    pub persistence_ticks: u32,
    /// Settling delay between shutdown steps [µs].
    pub settle_us: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            persistence_ticks: SHUTDOWN_PERSISTENCE_TICKS,
            settle_us: SHUTDOWN_SETTLE_US,
        }
    }
}

impl ShutdownConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.persistence_ticks == 0 {
            return Err("persistence_ticks must be > 0".to_string());
        }
        Ok(())
    }
}

/// Inclusive band `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// NaN is never inside a band.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Safe-to-approach pressure envelope [psi]. Ambient is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PressureEnvelope {
    pub primary_tank: Band,
    pub primary_line: Band,
    pub primary_actuator: Band,
    pub secondary_tank: Band,
    pub secondary_line: Band,
    pub secondary_actuator: Band,
    pub pressure_vessel: Band,
}

impl Default for PressureEnvelope {
    fn default() -> Self {
        Self {
            primary_tank: Band::new(-15.0, 30.0),
            primary_line: Band::new(-10.0, 20.0),
            primary_actuator: Band::new(-10.0, 20.0),
            secondary_tank: Band::new(-15.0, 30.0),
            secondary_line: Band::new(-10.0, 20.0),
            secondary_actuator: Band::new(-10.0, 20.0),
            pressure_vessel: Band::new(13.0, 20.0),
        }
    }
}

impl PressureEnvelope {
    /// Pair each checked channel name with its band and reading.
    pub fn channels(&self, p: &PressureReadings) -> [(&'static str, Band, f64); 7] {
        [
            ("primary_tank", self.primary_tank, p.primary_tank),
            ("primary_line", self.primary_line, p.primary_line),
            ("primary_actuator", self.primary_actuator, p.primary_actuator),
            ("secondary_tank", self.secondary_tank, p.secondary_tank),
            ("secondary_line", self.secondary_line, p.secondary_line),
            ("secondary_actuator", self.secondary_actuator, p.secondary_actuator),
            ("pressure_vessel", self.pressure_vessel, p.pressure_vessel),
        ]
    }

    /// First channel outside its band, if any.
    pub fn first_violation(&self, p: &PressureReadings) -> Option<(&'static str, f64)> {
        self.channels(p)
            .into_iter()
            .find(|(_, band, value)| !band.contains(*value))
            .map(|(name, _, value)| (name, value))
    }

    pub fn validate(&self) -> Result<(), String> {
        let zero = PressureReadings::default();
        for (name, band, _) in self.channels(&zero) {
            // Written so that a NaN bound also fails.
            let ordered = band.min <= band.max;
            if !ordered {
                return Err(format!(
                    "envelope.{name}: min {} must be <= max {}",
                    band.min, band.max
                ));
            }
        }
        Ok(())
    }
}
