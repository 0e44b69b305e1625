//! Integration test: config file → running machine.
//!
//! Validates: a TOML file on disk drives thresholds and timing of the
//! engine, and the shipped sample config loads.

use std::fs;
use std::path::Path;

use pod_common::config::PodConfig;
use pod_common::fault::{CheckPhase, Subsystem};
use pod_common::state::StateId;
use tempfile::TempDir;

use super::{Pod, TICK_US};

#[test]
fn file_thresholds_reach_the_engine() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("pod.toml");
    fs::write(
        &path,
        r#"
[shared]
service_name = "pod-cu-bench"

[policy]
debounce_threshold = 3

[timing]
crawl_timeout_us = 50000

[shutdown]
persistence_ticks = 2
settle_us = 0
"#,
    )
    .unwrap();

    let config = PodConfig::load_validated(&path).unwrap();
    let mut pod = Pod::with_config(config);

    pod.force(StateId::PostRun);
    pod.publish(|s| s.health.set_failing(Subsystem::Battery, CheckPhase::POSTRUN, true));
    pod.hold(2);
    assert_eq!(pod.step().entered(), Some(StateId::RunFault));

    pod.hold(1);
    assert!(pod.hardware.actuations().is_empty());
    pod.hold(1);
    assert_eq!(pod.hardware.actuations().len(), 5);

    pod.force(StateId::Crawl);
    pod.hold((50_000 / TICK_US) as usize - 1);
    assert_eq!(pod.step().entered(), Some(StateId::PostRun));
}

#[test]
fn sample_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/pod.toml");
    let config = PodConfig::load_validated(&path).unwrap();
    assert_eq!(config.shared.service_name, "pod-cu");
    assert!(!config.policy.reset_debounce_on_entry);
}
