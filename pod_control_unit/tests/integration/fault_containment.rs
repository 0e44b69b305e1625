//! Integration test: fault routing and staged shutdown.
//!
//! Validates: immediate faults (emergency brake, IMD, confirmed network
//! loss), transition-action reroute, and the 50-tick persistence gate in
//! front of the ordered shutdown sequence.

use pod_common::config::PodConfig;
use pod_common::consts::{NETWORK_LOSS_THRESHOLD, SHUTDOWN_PERSISTENCE_TICKS};
use pod_common::fault::FaultCause;
use pod_common::hardware::Transport;
use pod_common::state::StateId;
use pod_control_unit::machine::TickOutcome;
use pod_control_unit::sim::Actuation;

use super::Pod;

const RUN_SEQUENCE: [Actuation; 5] = [
    Actuation::HvEnable(false),
    Actuation::ClearMotorEnable,
    Actuation::NoTorque,
    Actuation::Discharge,
    Actuation::DisableInverter,
];

const NON_RUN_SEQUENCE: [Actuation; 5] = [
    Actuation::ClearMotorEnable,
    Actuation::NoTorque,
    Actuation::Discharge,
    Actuation::DisableInverter,
    Actuation::HvEnable(false),
];

#[test]
fn emergency_brake_routes_and_is_acknowledged() {
    let mut pod = Pod::new();
    pod.force(StateId::Propulsion);
    pod.publish(|s| s.flags.emergency_brake = true);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Propulsion,
            to: StateId::RunFault
        }
    );
    assert_eq!(pod.machine.last_fault_causes(), FaultCause::EMERGENCY_BRAKE);
    pod.hold(1);
    assert!(!pod.telemetry.snapshot().flags.emergency_brake);
}

#[test]
fn shutdown_waits_fifty_ticks_then_runs_in_order() {
    let mut pod = Pod::new();
    pod.publish(|s| s.flags.emergency_brake = true);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));

    let gate = SHUTDOWN_PERSISTENCE_TICKS as usize;
    pod.hold(gate - 1);
    assert!(pod.hardware.actuations().is_empty());
    assert_eq!(pod.machine.shutdown().counter(), SHUTDOWN_PERSISTENCE_TICKS - 1);

    pod.hold(1);
    assert_eq!(pod.hardware.actuations(), vec![Actuation::HvEnable(false)]);
    assert_eq!(pod.machine.shutdown().counter(), 0);

    pod.hold(4);
    assert_eq!(pod.hardware.actuations(), RUN_SEQUENCE.to_vec());
    assert!(!pod.hardware.hv_enabled());
    assert!(!pod.hardware.motor_enabled());

    // Idempotent: the next batch fires after another full gate.
    pod.hardware.clear_actuations();
    pod.hold(gate - 5);
    assert!(pod.hardware.actuations().is_empty());
    pod.hold(5);
    assert_eq!(pod.hardware.actuations(), RUN_SEQUENCE.to_vec());
    assert_eq!(pod.machine.shutdown().sequences_started(), 2);
}

#[test]
fn non_run_fault_drops_hv_last() {
    let mut pod = Pod::new();
    pod.force(StateId::NonRunFault);
    pod.hold(SHUTDOWN_PERSISTENCE_TICKS as usize + 4);
    assert_eq!(pod.hardware.actuations(), NON_RUN_SEQUENCE.to_vec());
}

#[test]
fn fault_reentry_keeps_persistence_count() {
    let mut pod = Pod::new();
    pod.force(StateId::RunFault);
    pod.hold(30);
    pod.force(StateId::RunFault);
    assert_eq!(pod.machine.shutdown().counter(), 30);
    pod.force(StateId::NonRunFault);
    assert_eq!(pod.machine.shutdown().counter(), 30);

    let remaining = SHUTDOWN_PERSISTENCE_TICKS as usize - 30;
    pod.hold(remaining - 1);
    assert!(pod.hardware.actuations().is_empty());
    pod.hold(1);
    assert_eq!(pod.hardware.actuations(), vec![Actuation::ClearMotorEnable]);
}

#[test]
fn fault_entry_from_operating_state_restarts_count() {
    let mut pod = Pod::new();
    pod.force(StateId::RunFault);
    pod.hold(30);
    pod.force(StateId::Idle);
    pod.force(StateId::RunFault);
    assert_eq!(pod.machine.shutdown().counter(), 0);
}

#[test]
fn network_loss_confirmed_after_threshold() {
    let mut pod = Pod::new();
    pod.force(StateId::PostRun);
    pod.hardware.set_link(Transport::Tcp, false);
    pod.hold(NETWORK_LOSS_THRESHOLD as usize - 1);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::PostRun,
            to: StateId::RunFault
        }
    );
    assert_eq!(pod.machine.last_fault_causes(), FaultCause::NETWORK_LOSS);
}

#[test]
fn network_blip_does_not_fault() {
    let mut config = PodConfig::with_service_name("integration");
    config.policy.network_loss_threshold = 5;
    let mut pod = Pod::with_config(config);
    pod.force(StateId::Stopped);
    pod.hardware.set_link(Transport::Udp, false);
    pod.hold(4);
    pod.hardware.set_link(Transport::Udp, true);
    pod.hold(1);
    pod.hardware.set_link(Transport::Udp, false);
    pod.hold(4);
    assert_eq!(pod.machine.network().consecutive_failures(), 4);
}

#[test]
fn imd_fault_in_crawl() {
    let mut pod = Pod::new();
    pod.force(StateId::Crawl);
    pod.hardware.set_imd_ok(false);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));
    assert_eq!(pod.machine.last_fault_causes(), FaultCause::IMD);
}

#[test]
fn imd_is_not_checked_in_propulsion() {
    let mut pod = Pod::new();
    pod.force(StateId::Propulsion);
    pod.hardware.set_imd_ok(false);
    pod.hold(50);
}

#[test]
fn refused_no_torque_reroutes_to_fault() {
    let mut pod = Pod::new();
    pod.force(StateId::Braking);
    pod.hardware.set_no_torque_fails(true);
    pod.clock.advance(15_000_000);
    assert_eq!(
        pod.step(),
        TickOutcome::Rerouted {
            from: StateId::Braking,
            attempted: StateId::Stopped,
            to: StateId::RunFault
        }
    );
    assert!(
        pod.machine
            .last_fault_causes()
            .contains(FaultCause::TRANSITION_FAILED)
    );
}

#[test]
fn pumpdown_timeout_faults() {
    let mut pod = Pod::new();
    pod.force(StateId::Pumpdown);
    pod.clock.advance(300_000_000);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));
    assert_eq!(pod.machine.last_fault_causes(), FaultCause::PUMPDOWN_TIMEOUT);
}
