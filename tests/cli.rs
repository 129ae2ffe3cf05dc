//! CLI behavior tests: exit codes, output formats, filters, init.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const COMPONENT: &str = "tests/fixtures/component_scores.csv";
const SUMMARY: &str = "tests/fixtures/summary_scores.csv";
const TERM2: &str = "tests/fixtures/term2";

fn gradelens_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gradelens"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    let s = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(s.trim()).expect("valid JSON")
}

#[test]
fn no_args_returns_error_not_panic() {
    let mut cmd = gradelens_cmd();
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("PATH").or(predicate::str::contains("path")));
}

#[test]
fn console_output_lists_anomalies() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--threshold").arg("1.5");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("HS05 (10A2) GK = 1"))
        .stdout(predicate::str::contains("low-outlier-vs-class"))
        .stdout(predicate::str::contains("Columns: TX1, TX2, GK, CK"));
}

#[test]
fn json_output_valid() {
    let mut cmd = gradelens_cmd();
    cmd.arg(SUMMARY).arg("--mode").arg("summary").arg("--threshold").arg("1.4").arg("--json");
    let parsed = json_of(&mut cmd);
    assert_eq!(parsed["mode"], "summary");
    assert_eq!(parsed["report"].as_array().unwrap().len(), 7);
    assert_eq!(parsed["report"][6]["value"], "missing");
    assert_eq!(parsed["summary"]["totalAnomalies"], 7);
}

#[test]
fn filters_narrow_the_report() {
    let mut cmd = gradelens_cmd();
    cmd.arg(SUMMARY)
        .args(["--mode", "summary", "--threshold", "1.4", "--json"])
        .args(["--kind", "low-outlier-vs-self", "--kind", "missing-value"])
        .args(["--severity", "low"]);
    let parsed = json_of(&mut cmd);
    let report = parsed["report"].as_array().unwrap();
    assert_eq!(report.len(), 2);
    assert!(report.iter().all(|r| r["kind"] == "low-outlier-vs-self"));
}

#[test]
fn class_filter() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).args(["--threshold", "1.5", "--class", "10A2", "--json"]);
    let parsed = json_of(&mut cmd);
    let report = parsed["report"].as_array().unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0]["studentId"], "HS05");
}

#[test]
fn fail_on_high_exit_1() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--fail-on").arg("high");
    cmd.assert().failure().code(1);
}

#[test]
fn fail_on_respects_filters() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT)
        .args(["--threshold", "1.5", "--fail-on", "medium", "--kind", "low-outlier-vs-class"]);
    cmd.assert().success();
}

#[test]
fn csv_export_has_fixed_header() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("anomalies.csv");
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--threshold").arg("1.5").arg("--csv").arg(&out).arg("--quiet");
    cmd.assert().success();

    let content = fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("student_id,class_id,column,value,kind,severity,explanation")
    );
    assert_eq!(lines.count(), 3);
    assert!(content.contains("HS02,10A1,CK,missing,missing-value,High,"));
}

#[test]
fn quiet_mode_one_line() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--quiet");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 anomalies (2 high, 0 medium, 0 low)"));
}

#[test]
fn verbose_shows_distribution() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--verbose");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Column Distribution"));
}

#[test]
fn directory_scan_respects_config_ignore() {
    let mut cmd = gradelens_cmd();
    cmd.arg(TERM2).arg("--json");
    let parsed = json_of(&mut cmd);
    // archive/ is excluded by tests/fixtures/term2/.gradelensrc.json, leaving one file
    assert!(parsed["filePath"].as_str().unwrap().ends_with("10a3_ngu_van.csv"));
    assert_eq!(parsed["report"].as_array().unwrap().len(), 1);
}

#[test]
fn many_files_get_aggregate_summary() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::copy(COMPONENT, dir.path().join("10a1.csv")).unwrap();
    fs::copy("tests/fixtures/term2/10a3_ngu_van.csv", dir.path().join("10a3.csv")).unwrap();

    let mut cmd = gradelens_cmd();
    cmd.arg(dir.path()).arg("--json").arg("--parallel");
    let parsed = json_of(&mut cmd);
    assert_eq!(parsed["summary"]["filesAnalyzed"], 2);
    assert_eq!(parsed["summary"]["totalStudents"], 9);
    assert_eq!(parsed["summary"]["totalAnomalies"], 3);
    assert_eq!(parsed["results"].as_array().unwrap().len(), 2);
}

#[test]
fn stdin_input() {
    let mut cmd = gradelens_cmd();
    cmd.arg("-")
        .arg("--json")
        .write_stdin("MaHS,lop,GK,CK\nHS01,10A1,7,\nHS02,10A1,6,8\n");
    let parsed = json_of(&mut cmd);
    assert!(parsed["filePath"].is_null());
    assert_eq!(parsed["report"][0]["studentId"], "HS01");
}

#[test]
fn file_without_score_columns_succeeds() {
    let mut cmd = gradelens_cmd();
    cmd.arg("tests/fixtures/no_scores.csv");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No anomalies found"));
}

#[test]
fn unknown_mode_exit_2() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--mode").arg("overall");
    cmd.assert().failure().code(2);
}

#[test]
fn invalid_threshold_exit_2() {
    let mut cmd = gradelens_cmd();
    cmd.arg(COMPONENT).arg("--threshold").arg("0");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid threshold"));
}

#[test]
fn file_not_found_exit_2() {
    let mut cmd = gradelens_cmd();
    cmd.arg("nonexistent.csv");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn init_creates_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join(".gradelensrc.json");
    let mut cmd = gradelens_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path()).args(["--threshold", "2", "--mode", "summary"]);
    cmd.assert().success();

    let content = fs::read_to_string(&config_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["threshold"], 2.0);
    assert_eq!(parsed["mode"], "summary");
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join(".gradelensrc.json");
    fs::write(&config_path, "{ \"threshold\": 3.0 }").unwrap();

    let mut cmd = gradelens_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "{ \"threshold\": 3.0 }");
}

#[test]
fn config_file_sets_mode_and_threshold() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::copy(SUMMARY, dir.path().join("hk1.csv")).unwrap();
    fs::write(
        dir.path().join(".gradelensrc.json"),
        r#"{ "mode": "summary", "threshold": 1.4, "ignoreKinds": ["missing-value"] }"#,
    )
    .unwrap();

    let mut cmd = gradelens_cmd();
    cmd.arg(dir.path().join("hk1.csv")).arg("--json");
    let parsed = json_of(&mut cmd);
    assert_eq!(parsed["mode"], "summary");
    assert_eq!(parsed["report"].as_array().unwrap().len(), 6);
}

#[test]
fn directory_scan_skips_extended_base_config() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::copy(COMPONENT, dir.path().join("10a1.csv")).unwrap();
    fs::write(dir.path().join("base.json"), r#"{ "threshold": 1.5 }"#).unwrap();
    fs::write(dir.path().join(".gradelensrc.json"), r#"{ "extends": "./base.json" }"#).unwrap();

    let mut cmd = gradelens_cmd();
    cmd.current_dir(dir.path()).arg(".").arg("--json");
    cmd.assert().success();
    let parsed = json_of(&mut cmd);
    assert!(parsed["filePath"].as_str().unwrap().ends_with("10a1.csv"));
    assert_eq!(parsed["threshold"], 1.5);
    assert_eq!(parsed["report"].as_array().unwrap().len(), 3);
}
