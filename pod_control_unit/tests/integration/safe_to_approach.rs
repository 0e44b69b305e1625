//! Integration test: safe-to-approach pressure envelope.
//!
//! Validates: inclusive band checks on the seven monitored channels, the
//! non-run fault sink, and the configurable envelope.

use pod_common::config::{Band, PodConfig};
use pod_common::fault::FaultCause;
use pod_common::hardware::Transport;
use pod_common::state::StateId;
use pod_control_unit::machine::TickOutcome;

use super::Pod;

#[test]
fn vessel_below_band_routes_to_non_run_fault() {
    let mut pod = Pod::new();
    pod.force(StateId::SafeToApproach);
    pod.publish(|s| s.pressure.pressure_vessel = 15.0);
    pod.hold(10);

    pod.publish(|s| s.pressure.pressure_vessel = 12.0);
    assert_eq!(
        pod.step(),
        TickOutcome::Transitioned {
            from: StateId::SafeToApproach,
            to: StateId::NonRunFault
        }
    );
    assert_eq!(pod.machine.last_fault_causes(), FaultCause::ENVELOPE);
    assert_eq!(pod.machine.state_code(), 10);
}

#[test]
fn each_channel_is_checked() {
    let readings: [(&str, fn(&mut pod_common::telemetry::PressureReadings)); 7] = [
        ("primary_tank", |p| p.primary_tank = 31.0),
        ("primary_line", |p| p.primary_line = -11.0),
        ("primary_actuator", |p| p.primary_actuator = 21.0),
        ("secondary_tank", |p| p.secondary_tank = -16.0),
        ("secondary_line", |p| p.secondary_line = 20.5),
        ("secondary_actuator", |p| p.secondary_actuator = -10.5),
        ("pressure_vessel", |p| p.pressure_vessel = 20.1),
    ];
    for (name, corrupt) in readings {
        let mut pod = Pod::new();
        pod.force(StateId::SafeToApproach);
        pod.publish(|s| corrupt(&mut s.pressure));
        assert_eq!(
            pod.step().entered(),
            Some(StateId::NonRunFault),
            "{name} out of band did not fault"
        );
    }
}

#[test]
fn network_loss_routes_to_non_run_fault() {
    let mut config = PodConfig::with_service_name("integration");
    config.policy.network_loss_threshold = 2;
    let mut pod = Pod::with_config(config);
    pod.force(StateId::SafeToApproach);
    pod.hardware.set_link(Transport::Udp, false);
    pod.hold(1);
    assert_eq!(pod.step().entered(), Some(StateId::NonRunFault));
}

#[test]
fn configured_envelope_applies() {
    let mut config = PodConfig::with_service_name("integration");
    config.envelope.pressure_vessel = Band::new(10.0, 20.0);
    let mut pod = Pod::with_config(config);
    pod.force(StateId::SafeToApproach);
    pod.publish(|s| s.pressure.pressure_vessel = 12.0);
    pod.hold(10);
}
