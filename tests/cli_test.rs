//! Smoke tests for the arduino-mentor binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arduino_mentor::exchange::TRANSPORT_APOLOGY;
use common::{candidate, temp_config_file, GENERATE_PATH};

/// Binary with a clean environment and an empty config file
fn mentor() -> (Command, tempfile::TempDir) {
    let (dir, config_path) = temp_config_file("provider:\n  type: gemini\n");
    let mut cmd = Command::cargo_bin("arduino-mentor").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .env_remove("MENTOR_PROVIDER")
        .env_remove("MENTOR_GEMINI_API_BASE")
        .env_remove("MENTOR_USER_NAME")
        .arg("--config")
        .arg(config_path)
        .arg("--no-persist");
    (cmd, dir)
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("arduino-mentor")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("shell"))
        .stdout(predicate::str::contains("components"));
}

#[test]
fn test_projects_list_shows_catalog() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["projects", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blink an LED"))
        .stdout(predicate::str::contains("ESP32 IoT Weather Station"));
}

#[test]
fn test_projects_list_filters_by_difficulty() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["projects", "list", "--difficulty", "advanced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ESP32 IoT Weather Station"))
        .stdout(predicate::str::contains("Blink an LED").not());
}

#[test]
fn test_components_list_by_type() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["components", "list", "--type", "sensor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BME280"))
        .stdout(predicate::str::contains("SG90 Micro Servo").not());
}

#[test]
fn test_prefs_show_lists_known_keys() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arduino_db_type"))
        .stdout(predicate::str::contains("arduino_db_difficulty"));
}

#[test]
fn test_prefs_set_rejects_unknown_key() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["prefs", "set", "theme", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown preference theme"));
}

#[test]
fn test_invalid_provider_fails_validation() {
    let (mut cmd, _dir) = mentor();
    cmd.args(["--provider", "bogus", "projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_prints_structured_reply() {
    let server = MockServer::start().await;

    let reply = json!({
        "text": "Connect the LED through a resistor.",
        "metadata": { "confidence": 0.9, "next_actions": ["Upload the blink sketch"] }
    });
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "cli-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&reply.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let (mut cmd, _dir) = mentor();
    cmd.env("GEMINI_API_KEY", "cli-key")
        .env("MENTOR_GEMINI_API_BASE", server.uri())
        .args(["--name", "Ada", "chat", "How do I wire an LED?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connect the LED through a resistor."))
        .stdout(predicate::str::contains("- Upload the blink sketch"))
        .stdout(predicate::str::contains("Confidence: 90%"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_failure_prints_apology_and_exits_nonzero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut cmd, _dir) = mentor();
    cmd.env("GEMINI_API_KEY", "cli-key")
        .env("MENTOR_GEMINI_API_BASE", server.uri())
        .args(["chat", "hello"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(TRANSPORT_APOLOGY));
}
