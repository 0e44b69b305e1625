//! Pod Common Library
//!
//! Shared types for the pod control workspace: state identifiers, the
//! telemetry snapshot published by acquisition threads, the operator
//! override slot, configuration loading, and the capability traits the
//! control unit consumes (hardware actuation, monotonic clock).
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and policy defaults
//! - [`state`] - Closed set of pod operating states
//! - [`telemetry`] - Telemetry snapshot and the shared cell that holds it
//! - [`fault`] - Check phases, subsystem health predicates, fault causes
//! - [`command`] - Operator override request slot
//! - [`hardware`] - Hardware capability trait
//! - [`clock`] - Monotonic microsecond clocks
//! - [`config`] - TOML configuration types and loader
//! - [`prelude`] - Common re-exports for convenience

pub mod clock;
pub mod command;
pub mod config;
pub mod consts;
pub mod fault;
pub mod hardware;
pub mod prelude;
pub mod state;
pub mod telemetry;
