//! Recovery tests for damaged local files and bad input data.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[server]\nurl = \"http://127.0.0.1:9\"\ntimeout_secs = 1\n\n[data]\ndata_dir = {:?}\n",
            dir.path()
        ),
    )
    .expect("Failed to write config");
    (dir, config)
}

fn cli(config: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("nlw"));
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_corrupted_credential_treated_as_signed_out() {
    let (dir, config) = setup();
    fs::write(dir.path().join("credential.json"), "{ not json").unwrap();

    cli(&config)
        .arg("categories")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[test]
fn test_login_replaces_corrupted_credential() {
    let (dir, config) = setup();
    let path = dir.path().join("credential.json");
    fs::write(&path, "garbage").unwrap();

    cli(&config)
        .arg("login")
        .arg("nlw://login?user=%7B%22emails%22%3A%5B%7B%22value%22%3A%22nick%40example.com%22%7D%5D%7D")
        .assert()
        .success();

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["emails"][0]["value"], "nick@example.com");
}

#[test]
fn test_credential_without_email_is_an_error() {
    let (dir, config) = setup();
    fs::write(dir.path().join("credential.json"), r#"{"emails": []}"#).unwrap();

    cli(&config)
        .arg("add-exercise")
        .arg("--name")
        .arg("Sled")
        .arg("--category")
        .arg("Conditioning")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Credential error"));
}

#[test]
fn test_logout_without_credential_succeeds() {
    let (_dir, config) = setup();

    cli(&config)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));
}

#[test]
fn test_truncated_history_file() {
    let (dir, config) = setup();
    let history = dir.path().join("history.json");
    fs::write(&history, r#"[{"WorkoutDate": "2024-01-01", "Exercises": {"Bis": [{"weig"#).unwrap();

    cli(&config)
        .arg("dashboard")
        .arg("--history-file")
        .arg(&history)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}

#[test]
fn test_bad_workout_date_in_history() {
    let (dir, config) = setup();
    let history = dir.path().join("history.json");
    fs::write(
        &history,
        r#"[{"WorkoutDate": "last tuesday", "Exercises": {"Bis": [{"weight": 10, "reps": 8}]}}]"#,
    )
    .unwrap();

    cli(&config)
        .arg("dashboard")
        .arg("--history-file")
        .arg(&history)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a calendar date"));
}

#[test]
fn test_malformed_nutrition_json() {
    let (dir, config) = setup();
    let response = dir.path().join("response.txt");
    fs::write(&response, "Here you go:\n```json\n{\"calories\": 200,\n```\n").unwrap();

    cli(&config)
        .arg("nutrition")
        .arg(&response)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed nutrition JSON"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[server]\nurl = \"ftp://example.com\"\n").unwrap();

    cli(&config)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.url must be an http(s) URL"));
}

#[test]
fn test_nutrition_ignores_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[server\nurl = ").unwrap();
    let response = dir.path().join("response.txt");
    fs::write(
        &response,
        "Looks like oatmeal.\n```json\n{\"servingSize\": \"1 cup\", \"calories\": 150, \"totalFat\": 3, \"saturatedFat\": 0.5, \"transFat\": 0, \"cholesterol\": 0, \"sodium\": 0, \"totalCarbohydrate\": 27, \"dietaryFiber\": 4, \"totalSugars\": 1, \"addedSugars\": 0, \"protein\": 5}\n```\n",
    )
    .unwrap();

    cli(&config)
        .arg("nutrition")
        .arg(&response)
        .assert()
        .success()
        .stdout(predicate::str::contains("Serving Size: 1 cup"));

    cli(&config)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOML error"));
}
