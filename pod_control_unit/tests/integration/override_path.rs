//! Integration test: operator override path.
//!
//! Validates: overrides land without an edge, unknown names are dropped
//! without side effects, overrides pre-empt guards, and recovery out of a
//! fault state.

use pod_common::fault::{CheckPhase, Subsystem};
use pod_common::state::StateId;
use pod_control_unit::machine::TickOutcome;

use super::Pod;

#[test]
fn idle_to_pumpdown_without_edge() {
    let mut pod = Pod::new();
    assert!(
        pod.machine
            .topology()
            .find_transition(StateId::Idle, StateId::Pumpdown)
            .is_none()
    );
    pod.overrides.request("pumpdown").unwrap();
    assert_eq!(
        pod.step(),
        TickOutcome::Overridden {
            from: StateId::Idle,
            to: StateId::Pumpdown
        }
    );
    assert_eq!(pod.state(), StateId::Pumpdown);
    assert_eq!(pod.machine.phase_elapsed_us(), 0);
    assert!(pod.hardware.actuations().is_empty());
    pod.hold(20);
}

#[test]
fn unknown_name_leaves_state_and_counters() {
    let mut pod = Pod::new();
    pod.force(StateId::PostRun);
    pod.publish(|s| s.health.set_failing(Subsystem::Rms, CheckPhase::POSTRUN, true));
    pod.hold(4);
    let counters = *pod.machine.counters();

    pod.overrides.request("post_runn").unwrap();
    assert_eq!(pod.step(), TickOutcome::OverrideIgnored);
    assert_eq!(pod.state(), StateId::PostRun);
    assert_eq!(*pod.machine.counters(), counters);
    assert!(!pod.overrides.is_pending());

    // The next tick evaluates the guard again.
    pod.hold(1);
    assert_eq!(pod.machine.counters().rms.count(), 5);
}

#[test]
fn override_preempts_emergency_brake() {
    let mut pod = Pod::new();
    pod.publish(|s| s.flags.emergency_brake = true);
    pod.overrides.request("servicing-precharge").unwrap();
    assert_eq!(pod.step().entered(), Some(StateId::ServicingPrecharge));
    // Guard runs on the following tick.
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));
}

#[test]
fn operator_recovers_from_fault() {
    let mut pod = Pod::new();
    pod.publish(|s| s.flags.emergency_brake = true);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));
    pod.hold(10);

    pod.overrides.request("IDLE").unwrap();
    assert_eq!(
        pod.step(),
        TickOutcome::Overridden {
            from: StateId::RunFault,
            to: StateId::Idle
        }
    );
    // Fault state acknowledged the brake, so idle holds.
    pod.hold(100);
    assert!(pod.hardware.actuations().is_empty());
}

#[test]
fn legacy_fault_spelling_resolves() {
    let mut pod = Pod::new();
    pod.overrides.request("non_run_fault").unwrap();
    assert_eq!(pod.step().entered(), Some(StateId::NonRunFault));
}

#[test]
fn latest_request_wins() {
    let mut pod = Pod::new();
    pod.overrides.request("crawl").unwrap();
    pod.overrides.request("stopped").unwrap();
    assert_eq!(pod.step().entered(), Some(StateId::Stopped));
    pod.hold(5);
}

#[test]
fn override_along_edge_runs_its_action() {
    let mut pod = Pod::new();
    pod.force(StateId::Crawl);
    pod.hardware.set_no_torque_fails(true);
    pod.overrides.request("post-run").unwrap();
    assert_eq!(
        pod.step(),
        TickOutcome::Overridden {
            from: StateId::Crawl,
            to: StateId::PostRun
        }
    );
    assert_eq!(pod.hardware.actuations().len(), 1);
}

#[test]
fn post_run_accepts_recovery_after_pressure_fault() {
    let mut pod = Pod::new();
    pod.force(StateId::Stopped);
    pod.publish(|s| s.health.set_failing(Subsystem::Pressure, CheckPhase::BRAKING, true));
    pod.hold(9);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));

    pod.publish(|s| s.health.set_failing(Subsystem::Pressure, CheckPhase::BRAKING, false));
    pod.hold(5);
    pod.force(StateId::PostRun);
    assert_eq!(pod.machine.counters().pressure.count(), 10);
    pod.hold(20);
}
