//! CLI integration tests
//!
//! Drive the `sleep-quality` binary end to end against temporary
//! directories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "Person ID,Gender,Age,Occupation,Sleep Duration,Quality of Sleep,\
Physical Activity Level,Stress Level,BMI Category,Blood Pressure,Heart Rate,Daily Steps,Sleep Disorder";

fn sleep_cmd() -> Command {
    let mut cmd = Command::cargo_bin("sleep-quality").expect("binary exists");
    cmd.env_remove("SLEEP_MODEL_DIR")
        .env_remove("SLEEP_DATA_PATH")
        .env("NO_COLOR", "1");
    cmd
}

/// 60 rows: well-rested low-stress subjects score 8, the rest score 5.
fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..60_u32 {
        let good = i % 2 == 0;
        let jitter = f64::from(i % 5) * 0.1;
        let (occupation, duration, stress, activity, heart, steps, quality, disorder) = if good {
            ("Engineer", 7.4 + jitter, 3, 60, 65, 8000, 8, "None")
        } else {
            ("Sales Representative", 5.4 + jitter, 8, 25, 85, 4000, 5, "Insomnia")
        };
        let gender = if i % 3 == 0 { "Male" } else { "Female" };
        writeln!(
            csv,
            "{},{gender},{},{occupation},{duration:.1},{quality},{activity},{stress},Normal,120/80,{heart},{steps},{disorder}",
            i + 1,
            30 + i % 20
        )
        .expect("write to string");
    }
    let path = dir.join("datasleep.csv");
    std::fs::write(&path, csv).expect("write csv");
    path
}

fn train_into(dir: &TempDir) -> std::path::PathBuf {
    let data = write_dataset(dir.path());
    let model_dir = dir.path().join("models");
    sleep_cmd()
        .arg("train")
        .arg("--data")
        .arg(&data)
        .arg("--model-dir")
        .arg(&model_dir)
        .args(["--n-estimators", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accuracy"));
    model_dir
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help() {
    sleep_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"));
}

#[test]
fn test_version() {
    sleep_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sleep-quality"));
}

// ============================================================================
// Train
// ============================================================================

#[test]
fn test_train_writes_artifact_pair() {
    let dir = TempDir::new().expect("tempdir");
    let model_dir = train_into(&dir);
    assert!(model_dir.join("model.bin").is_file());
    assert!(model_dir.join("meta.json").is_file());

    let meta: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(model_dir.join("meta.json")).expect("read meta"),
    )
    .expect("meta is json");
    assert!(meta["num_cols"].as_array().is_some_and(|c| !c.is_empty()));
    assert!(meta["accuracy"].as_f64().is_some());
}

#[test]
fn test_train_missing_target_lists_columns() {
    let dir = TempDir::new().expect("tempdir");
    let data = dir.path().join("no_target.csv");
    std::fs::write(&data, "Age,Sleep Duration\n30,7.0\n40,6.0\n").expect("write csv");
    sleep_cmd()
        .arg("train")
        .arg("--data")
        .arg(&data)
        .arg("--model-dir")
        .arg(dir.path().join("models"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("quality_of_sleep"))
        .stderr(predicate::str::contains("sleep_duration"));
    assert!(!dir.path().join("models").join("model.bin").exists());
}

#[test]
fn test_train_missing_dataset() {
    let dir = TempDir::new().expect("tempdir");
    sleep_cmd()
        .arg("train")
        .arg("--data")
        .arg(dir.path().join("absent.csv"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Dataset not found"));
}

// ============================================================================
// Predict
// ============================================================================

#[test]
fn test_predict_good_and_poor_profiles() {
    let dir = TempDir::new().expect("tempdir");
    let model_dir = train_into(&dir);

    sleep_cmd()
        .arg("predict")
        .arg("--model-dir")
        .arg(&model_dir)
        .args([
            "--record",
            r#"{"Sleep Duration": 7.8, "Stress Level": 3, "Occupation": "Engineer", "Physical Activity Level": 60, "Heart Rate": 65, "Daily Steps": 8000}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Predicted sleep quality: Good"));

    sleep_cmd()
        .arg("predict")
        .arg("--model-dir")
        .arg(&model_dir)
        .args([
            "--record",
            r#"{"sleep_duration": 5.2, "stress_level": 9, "occupation": "Sales Representative", "physical_activity_level": 20, "heart_rate": 90, "daily_steps": 3000, "sleep_disorder": "Insomnia"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Predicted sleep quality: Poor"))
        .stdout(predicate::str::contains("Tips:"));
}

#[test]
fn test_predict_json_from_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let model_dir = train_into(&dir);

    let output = sleep_cmd()
        .args(["--json", "predict", "--top", "3", "--no-tips"])
        .arg("--model-dir")
        .arg(&model_dir)
        .write_stdin(r#"{"sleep_duration": 7.6, "stress_level": 3, "occupation": "Pilot"}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    let p = value["probability"].as_f64().expect("probability");
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(value["importances"]["status"], "available");
    assert_eq!(
        value["importances"]["features"].as_array().map(Vec::len),
        Some(3)
    );
    assert!(value.get("tips").is_none());
}

#[test]
fn test_predict_threshold_out_of_range() {
    sleep_cmd()
        .args(["predict", "--threshold", "150", "--record", "{}"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_predict_invalid_json() {
    sleep_cmd()
        .args(["predict", "--record", "not json"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_predict_rejects_keys_naming_the_same_column() {
    sleep_cmd()
        .args([
            "predict",
            "--record",
            r#"{"Sleep Duration": 7.5, "sleep_duration": 4.0}"#,
        ])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("both map to column 'sleep_duration'"));
}

#[test]
fn test_predict_without_model() {
    let dir = TempDir::new().expect("tempdir");
    sleep_cmd()
        .arg("predict")
        .arg("--model-dir")
        .arg(dir.path())
        .args(["--record", r#"{"sleep_duration": 7}"#])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("model.bin"));
}

#[test]
fn test_info_shows_fields() {
    let dir = TempDir::new().expect("tempdir");
    let model_dir = train_into(&dir);
    sleep_cmd()
        .arg("info")
        .arg("--model-dir")
        .arg(&model_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("RandomForestClassifier"))
        .stdout(predicate::str::contains("sleep_duration"));
}
