//! Integration tests for the setlist binary.
//!
//! These tests verify end-to-end behavior including:
//! - Sample payloads and plan listing
//! - Auto-completed runs logged to the workout store
//! - Quit and resume through the session snapshot
//! - History and CSV rollup

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("setlist"))
}

/// Write the output of `setlist sample` to a file and return its path
fn write_sample(dir: &Path, kind: Option<&str>) -> PathBuf {
    let mut cmd = cli();
    cmd.arg("sample");
    if let Some(kind) = kind {
        cmd.arg("--kind").arg(kind);
    }
    let output = cmd.assert().success().get_output().stdout.clone();

    let path = dir.join(format!("{}.json", kind.unwrap_or("mixed")));
    fs::write(&path, output).expect("Failed to write sample");
    path
}

fn store_lines(data_dir: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(data_dir.join("workouts.jsonl"))
        .expect("Failed to read store")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Store line is not JSON"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout station progression engine"));
}

#[test]
fn test_catalog_search() {
    cli()
        .arg("catalog")
        .arg("--search")
        .arg("core")
        .assert()
        .success()
        .stdout(predicate::str::contains("plank"))
        .stdout(predicate::str::contains("back_squat").not());
}

#[test]
fn test_sample_is_a_valid_payload() {
    let temp_dir = setup_test_dir();
    let path = write_sample(temp_dir.path(), Some("triset"));

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let supersets = payload["supersets"].as_array().unwrap();
    assert_eq!(supersets.len(), 1);
    assert_eq!(supersets[0]["type"], "triset");
    assert_eq!(supersets[0]["exercises"].as_array().unwrap().len(), 3);
}

#[test]
fn test_sample_uses_configured_default_rest() {
    let temp_dir = setup_test_dir();
    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(config_dir.join("setlist")).unwrap();
    fs::write(
        config_dir.join("setlist").join("config.toml"),
        "[session]\ndefault_rest_seconds = 25\n",
    )
    .unwrap();

    let output = cli()
        .env("XDG_CONFIG_HOME", &config_dir)
        .arg("sample")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let exercises = payload["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 2);
    for exercise in exercises {
        assert_eq!(exercise["restTime"], 25);
    }
}

#[test]
fn test_plan_lists_standalone_before_supersets() {
    let temp_dir = setup_test_dir();
    let path = write_sample(temp_dir.path(), None);

    let output = cli()
        .arg("plan")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 0.0% (0/11 sets)"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8_lossy(&output);
    let bench = stdout.find("Bench Press").unwrap();
    let plank = stdout.find("Plank").unwrap();
    let superset = stdout.find("[Superset]").unwrap();
    assert!(bench < plank && plank < superset);
}

#[test]
fn test_auto_complete_run_logs_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = write_sample(temp_dir.path(), None);

    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .arg("--name")
        .arg("Push Day")
        .arg("--rpe")
        .arg("7")
        .assert()
        .success()
        .stdout(predicate::str::contains("All stations complete"))
        .stdout(predicate::str::contains("Workout logged! 100.0% (11/11 sets)"));

    let records = store_lines(&data_dir);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Push Day");
    assert_eq!(records[0]["completed"], true);
    assert_eq!(records[0]["postWorkoutData"]["rpe"], 7);
    assert!(!data_dir.join("session.json").exists());
}

#[test]
fn test_circuit_rounds_and_rests() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = write_sample(temp_dir.path(), Some("circuit"));

    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .assert()
        .success()
        .stdout(predicate::str::contains("(exercise 4/4, round 3/3)"))
        .stdout(predicate::str::contains("(exercise)"))
        .stdout(predicate::str::contains("(round)"))
        .stdout(predicate::str::contains("(12/12 sets)"));

    let records = store_lines(&data_dir);
    let superset = &records[0]["session"]["supersets"][0];
    assert_eq!(superset["roundCompleted"], serde_json::json!([true, true, true]));
}

#[test]
fn test_incomplete_set_is_rejected_and_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = temp_dir.path().join("plan.json");
    fs::write(
        &path,
        r#"{
            "exercises": [
                {"id": "00000000-0000-0000-0000-000000000001", "catalogId": "barbell_row",
                 "name": "Row", "sets": [{}, {}]},
                {"id": "00000000-0000-0000-0000-000000000002", "catalogId": "push_up",
                 "name": "Push-up", "sets": [{"reps": 10}]}
            ],
            "supersets": []
        }"#,
    )
    .unwrap();

    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .assert()
        .success()
        .stdout(predicate::str::contains("current set is missing a positive rep count"))
        .stdout(predicate::str::contains("(1/3 sets)"));
}

#[test]
fn test_rpe_out_of_range_is_refused() {
    let temp_dir = setup_test_dir();
    let path = write_sample(temp_dir.path(), None);

    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--auto-complete")
        .arg("--rpe")
        .arg("11")
        .assert()
        .failure();

    assert!(!temp_dir.path().join("workouts.jsonl").exists());
}

#[test]
fn test_quit_then_resume() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = write_sample(temp_dir.path(), None);

    // Complete one set, then quit
    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .write_stdin("\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session saved"));

    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("session.json")).unwrap())
            .unwrap();
    assert_eq!(snapshot["progression"]["stationIndex"], 0);
    assert_eq!(snapshot["progression"]["setIndex"], 1);

    cli()
        .arg("run")
        .arg("--resume")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .assert()
        .success()
        .stdout(predicate::str::contains("(set 2/3)"))
        .stdout(predicate::str::contains("(11/11 sets)"));

    assert!(!data_dir.join("session.json").exists());

    // Both versions share one id; history keeps the finished one
    let records = store_lines(&data_dir);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], records[1]["id"]);
    assert_eq!(records[0]["completed"], false);
    assert_eq!(records[1]["completed"], true);

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("done"))
        .stdout(predicate::str::contains("open").not());
}

#[test]
fn test_resume_without_snapshot_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("run")
        .arg("--resume")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = write_sample(temp_dir.path(), Some("superset"));

    for _ in 0..3 {
        cli()
            .arg("run")
            .arg(&path)
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--auto-complete")
            .assert()
            .success();
    }

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 workouts"));

    let csv_content = fs::read_to_string(data_dir.join("workouts.csv")).unwrap();
    assert!(csv_content.starts_with("id,date,sport,name,completed"));
    assert!(!data_dir.join("workouts.jsonl").exists());
}

#[test]
fn test_rollup_with_cleanup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let path = write_sample(temp_dir.path(), Some("superset"));

    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed store"));

    assert!(!data_dir.join("workouts.jsonl.processed").exists());
}

#[test]
fn test_empty_rollup() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_corrupted_store_and_snapshot_are_tolerated() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("workouts.jsonl"), "{ invalid json }\n{ more").unwrap();
    fs::write(data_dir.join("session.json"), "{ not a snapshot").unwrap();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts"));

    // An unreadable snapshot means there is nothing to resume
    cli()
        .arg("run")
        .arg("--resume")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No saved session"));

    let path = write_sample(temp_dir.path(), None);
    cli()
        .arg("run")
        .arg(&path)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--auto-complete")
        .assert()
        .success();
    assert!(!data_dir.join("session.json").exists());
}
