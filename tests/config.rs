//! Configuration system tests
//!
//! Tests for config paths and editor config loading/saving.

use tempfile::TempDir;
use trellis::config::EditorConfig;
use trellis::config_paths;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_returns_some() {
    assert!(config_paths::config_dir().is_some());
}

#[test]
fn test_config_dir_contains_app_name() {
    let dir = config_paths::config_dir().unwrap();
    assert!(dir.to_string_lossy().contains("trellis"));
}

#[test]
fn test_config_file_ends_with_yaml() {
    let path = config_paths::config_file().unwrap();
    assert!(path.to_string_lossy().ends_with("config.yaml"));
}

#[test]
fn test_logs_dir_is_inside_config_dir() {
    let config = config_paths::config_dir().unwrap();
    let logs = config_paths::logs_dir().unwrap();
    assert!(logs.starts_with(&config));
    assert!(logs.ends_with("logs"));
}

#[test]
fn test_log_file_uses_prefix() {
    let path = config_paths::log_file().unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(config_paths::LOG_FILE_PREFIX));
}

#[test]
fn test_newest_log_falls_back_to_prefix() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("logs");
    assert_eq!(
        config_paths::newest_log_in(&missing),
        missing.join(config_paths::LOG_FILE_PREFIX)
    );

    std::fs::create_dir_all(&missing).unwrap();
    std::fs::write(missing.join("other.txt"), "").unwrap();
    assert_eq!(
        config_paths::newest_log_in(&missing),
        missing.join(config_paths::LOG_FILE_PREFIX)
    );
}

#[test]
fn test_locations_under_a_base_dir() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    std::fs::create_dir_all(&logs).unwrap();
    std::fs::write(logs.join("trellis.log.2025-12-31"), "").unwrap();
    std::fs::write(logs.join("trellis.log.2026-03-01"), "").unwrap();

    let locations = config_paths::Locations::under(dir.path());
    assert_eq!(locations.config_file, dir.path().join("config.yaml"));
    assert_eq!(locations.logs_dir, logs);
    assert_eq!(locations.log_file, logs.join("trellis.log.2026-03-01"));
}

// ========================================================================
// Editor Config Tests
// ========================================================================

#[test]
fn test_save_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");
    let config = EditorConfig {
        undo_limit: 25,
        delete_confirm_threshold: 5,
        validate_empty_slots: false,
    };

    config.save_to(&path).unwrap();
    assert!(path.exists());
    assert_eq!(EditorConfig::load_from(&path), config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = EditorConfig::load_from(&dir.path().join("absent.yaml"));
    assert_eq!(loaded, EditorConfig::default());
}

#[test]
fn test_unparseable_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "undo_limit: [not, a, number]\n").unwrap();
    assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "theme: dark\ndelete_confirm_threshold: 3\n").unwrap();
    let loaded = EditorConfig::load_from(&path);
    assert_eq!(loaded.delete_confirm_threshold, 3);
    assert_eq!(loaded.undo_limit, 10);
}

#[test]
fn test_config_limits_flow_into_the_model() {
    let config = EditorConfig {
        undo_limit: 2,
        ..EditorConfig::default()
    };
    let model = trellis::EditorModel::new(config);
    assert_eq!(model.history.max_size(), 2);
}
