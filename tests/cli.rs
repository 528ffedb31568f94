use std::path::Path;

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::{json, Value};

const PRODUCTS: &str = r#"[{
    "serial_number": "201923456789012345",
    "name": "Back lawn",
    "mac_address": "AABBCCDDEEFF",
    "firmware_version": 3.3,
    "online": true,
    "mqtt_topics": {"command_in": "PRM100/AABBCCDDEEFF/commandIn", "command_out": "PRM100/AABBCCDDEEFF/commandOut"}
}]"#;

const TOKEN: &str =
    r#"{"access_token":"access-abc","refresh_token":"refresh-xyz","token_type":"Bearer","expires_in":3600}"#;

fn landroid(server: &Server, data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("landroid").unwrap();
    cmd.env("LANDROID_API_URL", format!("{}/api/v2/", server.url()))
        .env("LANDROID_AUTH_URL", server.url())
        .env("LANDROID_EMAIL", "me@example.com")
        .env("LANDROID_PASSWORD", "secret")
        .env("LANDROID_DATA_DIR", data_dir)
        .env("LANDROID_RETRY_WINDOW", "1")
        .env_remove("LANDROID_CLOUD")
        .env_remove("LANDROID_CLIENT_ID");
    cmd
}

fn mock_login(server: &mut Server, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::PartialJson(json!({
            "username": "me@example.com",
            "grant_type": "password",
        })))
        .with_body(TOKEN)
        .expect(hits)
        .create()
}

fn mock_products(server: &mut Server, hits: usize) -> mockito::Mock {
    server
        .mock("GET", "/api/v2/product-items")
        .match_header("Authorization", "Bearer access-abc")
        .with_body(PRODUCTS)
        .expect(hits)
        .create()
}

#[test]
fn codes_lists_both_tables() {
    let mut cmd = Command::cargo_bin("landroid").unwrap();
    let output = cmd.arg("codes").assert().success().get_output().stdout.clone();
    let tables: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(tables["status"]["7"], "Mowing");
    assert_eq!(tables["error"]["1"], "Trapped");
}

#[test]
fn unknown_or_missing_command_prints_usage() {
    Command::cargo_bin("landroid")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: landroid"));
    Command::cargo_bin("landroid")
        .unwrap()
        .arg("mow-everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command 'mow-everything'"));
}

#[test]
fn devices_logs_in_once_and_reuses_session() {
    let tempdir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let login = mock_login(&mut server, 1);
    let products = mock_products(&mut server, 2);

    landroid(&server, tempdir.path())
        .arg("devices")
        .assert()
        .success()
        .stdout(predicate::str::contains("Back lawn"))
        .stdout(predicate::str::contains("\"firmware\": \"3.3\""));
    assert!(tempdir.path().join("session-db/sessions.db").exists());

    landroid(&server, tempdir.path())
        .arg("devices")
        .assert()
        .success();

    login.assert();
    products.assert();
}

#[test]
fn rejected_login_fails() {
    let tempdir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let _m = server.mock("POST", "/oauth/token").with_status(401).create();

    landroid(&server, tempdir.path())
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("authentication rejected"));
}

#[test]
fn missing_password_is_reported() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = Server::new();

    landroid(&server, tempdir.path())
        .env_remove("LANDROID_PASSWORD")
        .arg("devices")
        .assert()
        .failure()
        .stderr(predicate::str::contains("LANDROID_PASSWORD is not set"));
}

#[test]
fn status_and_diagnostics() {
    let tempdir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let _login = mock_login(&mut server, 1);
    let _products = mock_products(&mut server, 2);
    let _status = server
        .mock("GET", "/api/v2/product-items/201923456789012345/status")
        .with_body(
            r#"{"dat":{"mac":"AABBCCDDEEFF","ls":7,"le":0,"bt":{"p":72}},"cfg":{"sn":"201923456789012345","sc":{"m":1}}}"#,
        )
        .create();

    let output = landroid(&server, tempdir.path())
        .args(["status", "201923456789012345"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let state: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(state["status"]["description"], "Mowing");
    assert_eq!(state["battery"]["percent"], 72);

    landroid(&server, tempdir.path())
        .args(["diagnostics", "201923456789012345"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**REDACTED**"))
        .stdout(predicate::str::contains("AABBCCDDEEFF").not())
        .stdout(predicate::str::contains("Back lawn"));
}

#[test]
fn unknown_serial_is_reported() {
    let tempdir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let _login = mock_login(&mut server, 1);
    let _products = mock_products(&mut server, 1);

    landroid(&server, tempdir.path())
        .args(["status", "SN-NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no mower with serial number SN-NOPE"));
}

#[test]
fn bad_arguments_fail_before_connecting() {
    let tempdir = tempfile::tempdir().unwrap();
    let server = Server::new();

    landroid(&server, tempdir.path())
        .args(["partymode", "SN1", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected 'on' or 'off'"));

    landroid(&server, tempdir.path())
        .args(["schedule-set", "SN1", "mon", "23:30", "45"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("runs past midnight"));
}
