use std::path::PathBuf;

use enrollname_recon::load::{load_directives_file, NameColumn};
use enrollname_recon::report::{write_report, OutputFile};
use enrollname_recon::{
    run, DecisionStatus, ReconError, ReconPolicy, ReconResult, RemoteDevice, SimulateOnly,
    UpdateOutcome,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Remote snapshot shared by the fixture scenarios.
fn snapshot() -> Vec<RemoteDevice> {
    vec![
        RemoteDevice::new("guid-01", "SN-NEW-01", ""),
        RemoteDevice::new("guid-02", "sn-same-02", "LAPTOP-02"),
        RemoteDevice::new("guid-03", "SN-TAKEN-03", "FRONT-DESK"),
        RemoteDevice::new("guid-05", "SN-DUP-05", ""),
        RemoteDevice::new("guid-06", "SN-DUP-06", ""),
        RemoteDevice::new("guid-07", "SN-FAIL-07", ""),
    ]
}

fn run_fixture(policy: ReconPolicy) -> (ReconResult, Vec<(String, String)>) {
    let loaded = load_directives_file(&fixtures_dir().join("directives.csv")).unwrap();
    let devices = snapshot();

    let mut sent = Vec::new();
    let mut action = |id: &str, name: &str| {
        sent.push((id.to_string(), name.to_string()));
        if id == "guid-07" {
            UpdateOutcome::Failed("HTTP 500: InternalServerError".into())
        } else {
            UpdateOutcome::Applied
        }
    };
    let result = run(&devices, &loaded.directives, &policy, &mut action);
    (result, sent)
}

fn status_of(result: &ReconResult, serial: &str) -> DecisionStatus {
    result
        .decisions
        .iter()
        .find(|d| d.serial_number == serial)
        .unwrap_or_else(|| panic!("no decision for {serial}"))
        .status
}

// -------------------------------------------------------------------------
// End-to-end classification
// -------------------------------------------------------------------------

#[test]
fn fixture_mixed_batch() {
    let (result, sent) = run_fixture(ReconPolicy::default());

    assert_eq!(result.summary.total, 7);
    assert_eq!(status_of(&result, "SN-NEW-01"), DecisionStatus::Updated);
    assert_eq!(status_of(&result, "SN-SAME-02"), DecisionStatus::NoChange);
    assert_eq!(status_of(&result, "SN-TAKEN-03"), DecisionStatus::AlreadyNamed);
    assert_eq!(status_of(&result, "SN-MISSING-04"), DecisionStatus::NoDeviceFound);
    assert_eq!(status_of(&result, "SN-DUP-05"), DecisionStatus::DuplicateName);
    assert_eq!(status_of(&result, "SN-DUP-06"), DecisionStatus::DuplicateName);
    assert_eq!(status_of(&result, "SN-FAIL-07"), DecisionStatus::Failed);

    // Only the two update candidates reached the action
    assert_eq!(
        sent,
        vec![
            ("guid-01".to_string(), "LAPTOP-01".to_string()),
            ("guid-07".to_string(), "LAPTOP-07".to_string()),
        ]
    );

    assert_eq!(result.duplicates.len(), 1);
    assert_eq!(result.duplicates[0].name_key, "kiosk");
    assert_eq!(result.duplicates[0].count, 2);
}

#[test]
fn fixture_forced_overwrites_existing_name() {
    let (result, sent) = run_fixture(ReconPolicy::forced());
    assert_eq!(status_of(&result, "SN-TAKEN-03"), DecisionStatus::Updated);
    assert_eq!(status_of(&result, "SN-SAME-02"), DecisionStatus::NoChange);
    assert!(sent.iter().any(|(id, _)| id == "guid-03"));
    assert_eq!(result.summary.updated, 2);
    assert_eq!(result.summary.failed, 1);
}

#[test]
fn fixture_simulate_sends_nothing() {
    let loaded = load_directives_file(&fixtures_dir().join("directives.csv")).unwrap();
    let devices = snapshot();
    let mut sim = SimulateOnly::default();
    let result = run(&devices, &loaded.directives, &ReconPolicy::default(), &mut sim);

    assert_eq!(result.summary.simulated, 2);
    assert_eq!(result.summary.updated, 0);
    assert_eq!(result.summary.failed, 0);
    assert_eq!(sim.would_apply.len(), 2);
}

#[test]
fn decisions_keep_input_order() {
    let (result, _) = run_fixture(ReconPolicy::default());
    let serials: Vec<&str> = result
        .decisions
        .iter()
        .map(|d| d.serial_number.as_str())
        .collect();
    assert_eq!(
        serials,
        vec![
            "SN-NEW-01",
            "SN-SAME-02",
            "SN-TAKEN-03",
            "SN-MISSING-04",
            "SN-DUP-05",
            "SN-DUP-06",
            "SN-FAIL-07",
        ]
    );
}

// -------------------------------------------------------------------------
// Loader fixtures
// -------------------------------------------------------------------------

#[test]
fn edited_export_feeds_back_as_directives() {
    let loaded = load_directives_file(&fixtures_dir().join("export-edited.csv")).unwrap();
    assert_eq!(loaded.name_column, NameColumn::DisplayName);
    assert_eq!(loaded.directives.len(), 2);
    assert_eq!(loaded.stats.dropped_blank, 1);

    let devices = snapshot();
    let mut sim = SimulateOnly::default();
    let result = run(&devices, &loaded.directives, &ReconPolicy::default(), &mut sim);
    assert_eq!(status_of(&result, "SN-NEW-01"), DecisionStatus::Simulated);
    assert_eq!(status_of(&result, "SN-SAME-02"), DecisionStatus::NoChange);
}

#[test]
fn messy_input_is_normalized() {
    let loaded = load_directives_file(&fixtures_dir().join("messy.csv")).unwrap();
    assert_eq!(loaded.directives.len(), 2);
    assert_eq!(loaded.stats.rows_read, 4);
    assert_eq!(loaded.stats.dropped_blank, 1);
    assert_eq!(loaded.stats.replaced, 1);
    assert_eq!(
        loaded.directives.get("SN-NEW-01").unwrap().desired_name,
        "LAPTOP-01B"
    );
}

#[test]
fn missing_name_column_is_reported() {
    let err = load_directives_file(&fixtures_dir().join("no-name-column.csv")).unwrap_err();
    match err {
        ReconError::MissingColumn { column, found, .. } => {
            assert!(column.contains("DesiredName"));
            assert_eq!(found, vec!["SerialNumber", "Model"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// -------------------------------------------------------------------------
// Report output
// -------------------------------------------------------------------------

#[test]
fn report_file_has_one_row_per_directive() {
    let (result, _) = run_fixture(ReconPolicy::default());
    let dir = tempfile::tempdir().unwrap();
    let path = OutputFile::create(dir.path().join("report.csv"))
        .unwrap()
        .write_report(&result.decisions)
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + result.decisions.len());
    assert!(lines[0].starts_with("SerialNumber,DesiredName,Status"));
    assert!(lines[1].contains("DuplicateName"));
    assert!(lines.last().unwrap().contains("HTTP 500: InternalServerError"));
}

#[test]
fn report_is_deterministic() {
    let (first, _) = run_fixture(ReconPolicy::default());
    let (second, _) = run_fixture(ReconPolicy::default());

    let mut a = Vec::new();
    let mut b = Vec::new();
    write_report(&first.decisions, &mut a).unwrap();
    write_report(&second.decisions, &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn result_serializes_to_json() {
    let (result, _) = run_fixture(ReconPolicy::default());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["total"], 7);
    assert_eq!(json["decisions"][0]["status"], "Updated");
    assert_eq!(json["decisions"][0]["device_id"], "guid-01");
    assert!(json["decisions"][3].get("device_id").is_none());
    assert_eq!(json["meta"]["force_update"], false);
}
