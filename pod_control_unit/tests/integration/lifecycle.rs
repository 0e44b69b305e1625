//! Integration test: nominal run profile.
//!
//! Validates: propulsion → braking on retro markers and ready-to-brake,
//! braking → stopped on the 15 s timer, crawl → post-run on retro advance,
//! and the no-torque command on every deceleration edge.

use pod_common::consts::{BRAKING_COMPLETE_US, PROPULSION_TIMEOUT_US};
use pod_common::fault::{CheckPhase, Subsystem};
use pod_common::state::StateId;
use pod_common::telemetry::TelemetrySnapshot;
use pod_control_unit::machine::TickOutcome;
use pod_control_unit::sim::Actuation;

use super::{Pod, TICK_US};

#[test]
fn full_run_reaches_post_run() {
    let mut pod = Pod::new();
    pod.hold(10);
    pod.force(StateId::Pumpdown);
    pod.hold(10);
    pod.force(StateId::Propulsion);
    pod.hold(50);

    pod.publish(|s| s.motion.retro_count = 3);
    pod.hold(5);
    pod.publish(|s| s.flags.ready_to_brake = true);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Propulsion,
            to: StateId::Braking
        }
    );

    let braking_ticks = (BRAKING_COMPLETE_US / TICK_US) as usize;
    pod.hold(braking_ticks - 1);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Braking,
            to: StateId::Stopped
        }
    );
    pod.hold(100);

    pod.force(StateId::Crawl);
    assert_eq!(pod.machine.crawl_retro_reference(), 3);
    pod.publish(|s| s.motion.retro_count = 5);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Crawl,
            to: StateId::PostRun
        }
    );
    pod.hold(100);

    assert_eq!(
        pod.hardware.actuations(),
        vec![Actuation::NoTorque, Actuation::NoTorque, Actuation::NoTorque]
    );
}

#[test]
fn braking_completes_even_when_checks_pass() {
    let mut pod = Pod::new();
    pod.force(StateId::Braking);
    pod.clock.advance(BRAKING_COMPLETE_US - TICK_US - 1);
    assert_eq!(pod.machine.tick(), TickOutcome::Stayed);
    pod.clock.advance(1);
    assert_eq!(pod.step().entered(), Some(StateId::Stopped));
}

#[test]
fn propulsion_timeout_moves_to_braking() {
    let mut pod = Pod::new();
    pod.force(StateId::Propulsion);
    pod.clock.advance(PROPULSION_TIMEOUT_US - TICK_US);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Propulsion,
            to: StateId::Braking
        }
    );
    assert!(pod.machine.last_fault_causes().is_empty());
}

fn pressure_failing(on: bool) -> impl FnOnce(&mut TelemetrySnapshot) {
    move |s| s.health.set_failing(Subsystem::Pressure, CheckPhase::BRAKING, on)
}

#[test]
fn nine_failures_then_pass_resets_debounce() {
    let mut pod = Pod::new();
    pod.force(StateId::Stopped);

    pod.publish(pressure_failing(true));
    pod.hold(9);
    assert_eq!(pod.machine.counters().pressure.count(), 9);

    pod.publish(pressure_failing(false));
    pod.hold(1);
    assert_eq!(pod.machine.counters().pressure.count(), 0);

    pod.publish(pressure_failing(true));
    pod.hold(9);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::Stopped,
            to: StateId::RunFault
        }
    );
}

#[test]
fn braking_rms_fault_only_counts_after_delay() {
    let mut pod = Pod::new();
    pod.publish(|s| s.health.set_failing(Subsystem::Rms, CheckPhase::BRAKING, true));
    pod.force(StateId::Braking);
    // Just under ten seconds of braking with a failing motor controller.
    pod.hold(999);
    assert_eq!(pod.machine.counters().rms.count(), 0);
    pod.hold(9);
    assert_eq!(pod.machine.counters().rms.count(), 9);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));
    assert_eq!(pod.state(), StateId::RunFault);
}
