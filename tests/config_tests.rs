// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use checkin_scanner::Config;
use checkin_scanner::backends::camera::CameraBackendType;
use checkin_scanner::constants;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.api_base_url, constants::DEFAULT_API_BASE_URL);
    assert_eq!(config.backend, CameraBackendType::V4l2);
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
    assert_eq!(config.capture_settings().fps, 10);
    assert_eq!(config.capture_settings().window, 250);
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        last_event_id: Some("e1".to_string()),
        last_camera_path: Some("/dev/video2".to_string()),
        backend: CameraBackendType::Files,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path), config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from(&dir.path().join("absent.json")), Config::default());
}

#[test]
fn test_invalid_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(Config::load_from(&path), Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"scan_fps": 5}"#).unwrap();

    let config = Config::load_from(&path);
    assert_eq!(config.scan_fps, 5);
    assert_eq!(config.detection_window, constants::scan::DEFAULT_WINDOW_SIZE);
}

#[test]
fn test_environment_overrides_file() {
    let mut config = Config::default();
    config.apply_env_from(|key| match key {
        "CHECKIN_API_URL" => Some("http://localhost:5000/api".to_string()),
        "CHECKIN_TOKEN" => Some("t0ken".to_string()),
        _ => None,
    });
    assert_eq!(config.api_base_url, "http://localhost:5000/api");
    assert_eq!(config.session_token.as_deref(), Some("t0ken"));

    // Blank values are ignored
    config.apply_env_from(|_| Some("  ".to_string()));
    assert_eq!(config.api_base_url, "http://localhost:5000/api");
}

#[test]
fn test_out_of_range_fps_is_clamped() {
    let config = Config {
        scan_fps: 0,
        ..Config::default()
    };
    assert_eq!(config.capture_settings().fps, 1);

    let config = Config {
        scan_fps: 1000,
        ..Config::default()
    };
    assert_eq!(config.capture_settings().fps, constants::scan::MAX_FPS);
}

#[test]
fn test_update_keeps_overrides_off_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    Config {
        last_camera_path: Some("/dev/video0".to_string()),
        ..Config::default()
    }
    .save_to(&path)
    .unwrap();

    // Running config as built from file, environment and flags
    let mut running = Config::load_from(&path);
    running.apply_env_from(|key| match key {
        "CHECKIN_TOKEN" => Some("one-shot".to_string()),
        "CHECKIN_API_URL" => Some("http://staging.local/api".to_string()),
        _ => None,
    });
    running.backend = CameraBackendType::Files;
    assert_eq!(running.session_token.as_deref(), Some("one-shot"));

    Config::update_at(&path, |stored| stored.last_event_id = Some("e7".to_string())).unwrap();

    let saved = Config::load_from(&path);
    assert_eq!(saved.last_event_id.as_deref(), Some("e7"));
    assert_eq!(saved.last_camera_path.as_deref(), Some("/dev/video0"));
    assert_eq!(saved.session_token, None);
    assert_eq!(saved.api_base_url, constants::DEFAULT_API_BASE_URL);
    assert_eq!(saved.backend, CameraBackendType::V4l2);
}
