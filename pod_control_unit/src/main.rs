//! # Pod Control Unit
//!
//! Fixed-period control loop for the pod operating-state machine.
//!
//! Loads `PodConfig`, builds the state topology (a defect is fatal before the
//! loop starts), performs RT setup, and ticks the machine until Ctrl-C or
//! `--max-cycles`. Runs against the simulated hardware backend; console
//! lines on stdin are operator input (state names request an override,
//! `:ebrake on`, `:stop on`, `:ready on`, `:retro N` drive telemetry).

use clap::Parser;
use pod_common::clock::SystemClock;
use pod_common::command::OverrideSlot;
use pod_common::config::{LogLevel, PodConfig};
use pod_common::consts::DEFAULT_CONFIG_PATH;
use pod_common::telemetry::TelemetryCell;
use pod_control_unit::cycle::{CycleRunner, rt_setup};
use pod_control_unit::machine::PodStateMachine;
use pod_control_unit::sim::{OperatorInput, SimulatedHardware, spawn_telemetry_feed};
use pod_control_unit::topology::Topology;
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Pod Control Unit: operating-state machine control loop
#[derive(Parser, Debug)]
#[command(name = "pod_control_unit")]
#[command(version)]
#[command(about = "Hyperloop pod operating-state machine and fault containment loop")]
struct Args {
    /// Path to the control unit configuration TOML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Config is read before tracing so its log level can seed the filter.
    let config = PodConfig::load_validated(&args.config);
    let level = match &config {
        Ok(c) => c.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    info!("Pod Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Pod Control Unit shutdown complete");
}

fn run(args: &Args, config: PodConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: service={}, cycle_time={}µs, debounce={}",
        config.shared.service_name, config.cycle.cycle_time_us, config.policy.debounce_threshold,
    );

    let topology = Topology::build()?;
    info!("Topology built: {} edges", topology.edge_count());

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let telemetry = TelemetryCell::default();
    let overrides = OverrideSlot::new();
    let period = Duration::from_micros(config.cycle.cycle_time_us as u64);

    let feed = spawn_telemetry_feed(telemetry.clone(), running.clone(), period)?;
    spawn_console(overrides.clone(), telemetry.clone())?;

    let machine = PodStateMachine::new(
        topology,
        config,
        SimulatedHardware::new(),
        SystemClock::new(),
        telemetry,
        overrides,
    );

    let mut runner = CycleRunner::new(machine, running.clone()).with_max_cycles(args.max_cycles);
    let outcome = runner.run();

    running.store(false, Ordering::SeqCst);
    if feed.join().is_err() {
        warn!("Telemetry feed thread panicked");
    }
    outcome?;

    info!(
        "Final state: {} (code {})",
        runner.machine().current_name(),
        runner.machine().state_code()
    );
    Ok(())
}

/// Read operator input from stdin on a detached thread.
fn spawn_console(
    overrides: OverrideSlot,
    telemetry: TelemetryCell,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("operator-console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => OperatorInput::parse(&line).apply(&overrides, &telemetry),
                    Err(e) => {
                        warn!("Console read failed: {e}");
                        break;
                    }
                }
            }
        })
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
