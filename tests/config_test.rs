//! Tests for client configuration loading.

use std::io::Write;
use std::time::Duration;

use dragon_client::{ClientConfig, DEFAULT_GAME_DURATION};
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.server_url(), "http://localhost:8080/libreDragon/api");
    assert_eq!(config.default_duration(), DEFAULT_GAME_DURATION);
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.timer_tick(), Duration::from_secs(1));
    assert_eq!(config.log_file(), "dragon_client.log");
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = config_file(
        r#"
server_url = "http://games.example/api"
default_duration_secs = 300
"#,
    );

    let config = ClientConfig::from_file(file.path()).expect("Failed to load config");

    assert_eq!(config.server_url(), "http://games.example/api");
    assert_eq!(config.default_duration(), Duration::from_secs(300));
    assert_eq!(
        config.controller_settings().default_duration,
        Duration::from_secs(300)
    );
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.log_file(), "dragon_client.log");
}

#[test]
fn test_invalid_toml_fails() {
    let file = config_file("server_url = ");

    let err = ClientConfig::from_file(file.path()).expect_err("should not parse");

    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_missing_file_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let err = ClientConfig::from_file(dir.path().join("absent.toml"))
        .expect_err("file does not exist");

    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_zero_duration_rejected() {
    let file = config_file("default_duration_secs = 0\n");

    let err = ClientConfig::from_file(file.path()).expect_err("zero duration");

    assert!(err.message.contains("default_duration_secs"));
}

#[test]
fn test_server_url_override() {
    let config = ClientConfig::default().with_server_url("http://other/api");
    assert_eq!(config.server_url(), "http://other/api");
}
