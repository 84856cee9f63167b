mod support;

use std::fs;

use cosim_core::launch::LAUNCH_SCRIPT_NAME;
use cosim_core::document::FNCS_BROKER_ADDRESS;
use cosim_core::{Platform, TopologyKind};
use cosim_sweep::manifest::{SweepManifest, MANIFEST_NAME};
use cosim_sweep::sweep::{RESULTS_JSON_NAME, RESULTS_TABLE_NAME};
use cosim_sweep::{Outcome, SweepController};
use support::{fake_federate, hanging_federate, test_settings};
use tempfile::tempdir;

#[test]
fn fan_in_sweep_records_one_success_per_point() {
    let root = tempdir().unwrap();
    let settings = test_settings(root.path(), fake_federate(root.path()));
    let experiment_root = settings.experiment_root();

    let table = SweepController::new(settings).run();

    assert_eq!(table.len(), 4);
    assert_eq!(table.count(Outcome::Success), 4);
    let order: Vec<_> = table
        .rows()
        .iter()
        .map(|row| (row.experiment, row.federates, row.core_type.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![(0, 1, "zmq"), (1, 1, "tcp"), (2, 2, "zmq"), (3, 2, "tcp")]
    );
    for row in table.rows() {
        assert_eq!(row.timings.exec_wall, 2.0);
    }

    let dir = experiment_root.join("tcp").join("test_f_2_m_1_b_4");
    for name in ["sender0.json", "sender1.json", "echo.json", LAUNCH_SCRIPT_NAME] {
        assert!(dir.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn results_tables_and_manifest_are_written() {
    let root = tempdir().unwrap();
    let settings = test_settings(root.path(), fake_federate(root.path()));
    let experiment_root = settings.experiment_root();
    let fingerprint = settings.fingerprint();

    SweepController::new(settings).run();

    let csv_path = experiment_root.join(RESULTS_TABLE_NAME);
    let csv = fs::read_to_string(csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("experiment,experiment type,"));
    assert!(lines[1].starts_with("0,FanIn,HELICS,zmq,success,1,1,4,"));

    let json_path = experiment_root.join(RESULTS_JSON_NAME);
    let json = fs::read_to_string(json_path).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(4));
    assert_eq!(rows[3]["core_type"], "tcp");
    assert_eq!(rows[3]["status"], "success");

    let manifest_path = experiment_root.join(MANIFEST_NAME);
    let manifest = fs::read_to_string(manifest_path).unwrap();
    let manifest: SweepManifest = serde_json::from_str(&manifest).unwrap();
    assert_eq!(manifest.total_points, 4);
    assert_eq!(manifest.succeeded, 4);
    assert_eq!(manifest.settings_fingerprint, fingerprint);
}

#[test]
fn failing_federates_still_yield_a_full_table() {
    let root = tempdir().unwrap();
    let settings = test_settings(root.path(), "false".to_string());

    let table = SweepController::new(settings).run();

    assert_eq!(table.len(), 4);
    assert_eq!(table.count(Outcome::Failure), 4);
    assert!(table.rows().iter().all(|row| row.timings.is_zero()));
}

#[test]
fn ring_without_neighbors_is_recorded_as_failure() {
    let root = tempdir().unwrap();
    let mut settings = test_settings(root.path(), fake_federate(root.path()));
    settings.experiment_type = TopologyKind::Ring;
    settings.federate_numbers = vec![1, 3];
    settings.core_types = vec!["zmq".to_string()];
    let experiment_root = settings.experiment_root();

    let table = SweepController::new(settings).run();

    let outcomes: Vec<_> = table.rows().iter().map(|row| row.status).collect();
    assert_eq!(outcomes, vec![Outcome::Failure, Outcome::Success]);
    let fan_in_dir = experiment_root.join("zmq").join("test_f_1_m_1_b_4");
    assert!(!fan_in_dir.exists());
    let ring_dir = experiment_root.join("zmq").join("test_f_3_m_1_b_4");
    for name in ["fed0.json", "fed1.json", "fed2.json"] {
        assert!(ring_dir.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn fncs_ring_sweep_writes_fncs_documents() {
    let root = tempdir().unwrap();
    let mut settings = test_settings(root.path(), fake_federate(root.path()));
    settings.platform = Platform::Fncs;
    settings.experiment_type = TopologyKind::Ring;
    settings.federate_numbers = vec![3];
    settings.core_types = vec!["zmq".to_string()];
    settings.ring_neighbors = Some(2);
    let dir = settings
        .experiment_root()
        .join("zmq")
        .join("test_f_3_m_1_b_4");

    let table = SweepController::new(settings).run();

    assert_eq!(table.count(Outcome::Success), 1);
    assert_eq!(table.rows()[0].platform, Platform::Fncs);
    let contents = fs::read_to_string(dir.join("fed1.yaml")).unwrap();
    let document: serde_yaml::Value = serde_yaml::from_str(&contents).unwrap();
    assert_eq!(document["name"].as_str(), Some("fed1"));
    assert_eq!(document["broker"].as_str(), Some(FNCS_BROKER_ADDRESS));
    assert_eq!(
        document["values"]["m0::fed0"]["topic"].as_str(),
        Some("fed0/m0")
    );
    assert_eq!(
        document["values"]["m0::fed2"]["topic"].as_str(),
        Some("fed2/m0")
    );
    assert!(!dir.join("fed1.json").exists());
}

#[test]
fn rerunning_a_sweep_rebuilds_directories_identically() {
    let root = tempdir().unwrap();
    let settings = test_settings(root.path(), fake_federate(root.path()));
    let dir = settings
        .experiment_root()
        .join("zmq")
        .join("test_f_2_m_1_b_4");

    SweepController::new(settings.clone()).run();
    let script = fs::read(dir.join(LAUNCH_SCRIPT_NAME)).unwrap();
    let echo = fs::read(dir.join("echo.json")).unwrap();
    fs::write(dir.join("leftover.txt"), "stale").unwrap();

    let table = SweepController::new(settings).run();

    assert_eq!(table.count(Outcome::Success), 4);
    assert_eq!(fs::read(dir.join(LAUNCH_SCRIPT_NAME)).unwrap(), script);
    assert_eq!(fs::read(dir.join("echo.json")).unwrap(), echo);
    assert!(!dir.join("leftover.txt").exists());
}

#[test]
fn hung_point_is_recorded_as_timeout() {
    let root = tempdir().unwrap();
    let mut settings = test_settings(root.path(), hanging_federate(root.path()));
    settings.federate_numbers = vec![1];
    settings.core_types = vec!["zmq".to_string()];
    settings.simulation_timeout_secs = 1;

    let table = SweepController::new(settings).run();

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].status, Outcome::Timeout);
    assert!(table.rows()[0].timings.is_zero());
}
