//! # Pod Control Unit Library
//!
//! Operating-state machine for a hyperloop pod. A fixed graph of 11 states
//! is ticked once per control cycle; each state's guard reads one telemetry
//! snapshot, debounces subsystem faults and decides whether to stay, advance
//! or route to a fault state. Fault states run a staged, non-blocking
//! hardware shutdown until an operator override moves the pod on.
//!
//! ## Modules
//!
//! - [`topology`]: state graph, built once at startup
//! - [`debounce`]: consecutive-failure counters and network-loss monitor
//! - [`guard`]: per-state tick guards
//! - [`shutdown`]: staged fault shutdown sequencer
//! - [`machine`]: execution engine
//! - [`cycle`]: RT setup and fixed-period cycle runner
//! - [`sim`]: simulated hardware, telemetry feed and operator console
//!
//! ## Zero-Allocation Tick
//!
//! The topology uses fixed-capacity edge lists and the tick path copies the
//! telemetry snapshot by value. The simulation backend keeps a fixed-size
//! actuation window, so a pod parked in a fault state does not grow memory.

pub mod cycle;
pub mod debounce;
pub mod guard;
pub mod machine;
pub mod shutdown;
pub mod sim;
pub mod topology;
