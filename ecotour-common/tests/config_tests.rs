//! Tests for configuration loading and graceful degradation
//!
//! Uses serial_test: tests touching ECOTOUR_* environment variables run
//! sequentially, not in parallel.

use ecotour_common::config::{
    load_config, ConfigSource, TomlConfig, CONFIG_ENV_VAR, PLACES_KEY_ENV_VAR, PORT_ENV_VAR,
    ROOT_FOLDER_ENV_VAR,
};
use ecotour_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn clear_env() {
    for var in [
        CONFIG_ENV_VAR,
        ROOT_FOLDER_ENV_VAR,
        PORT_ENV_VAR,
        PLACES_KEY_ENV_VAR,
        "ECOTOUR_SUGGESTION_API_KEY",
        "ECOTOUR_ROUTES_API_KEY",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_explicit_config_file_is_loaded() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/ecotour"

        [logging]
        level = "debug"

        [services]
        routes_url = "http://routes.internal/optimize"
        "#,
    )
    .unwrap();

    let (config, source) = load_config(Some(&path)).unwrap();
    assert_eq!(source, ConfigSource::Explicit(path.clone()));
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/ecotour")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.services.routes_url, "http://routes.internal/optimize");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = load_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_overrides_take_priority_over_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/from/toml"

        [server]
        port = 7000

        [services]
        places_api_key = "toml-key"
        "#,
    )
    .unwrap();

    env::set_var(ROOT_FOLDER_ENV_VAR, "/from/env");
    env::set_var(PORT_ENV_VAR, "7100");
    env::set_var(PLACES_KEY_ENV_VAR, "env-key");

    let (config, _) = load_config(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.root_folder, Some(PathBuf::from("/from/env")));
    assert_eq!(config.server.port, 7100);
    assert_eq!(config.services.places_api_key.as_deref(), Some("env-key"));
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    clear_env();
    env::set_var(PLACES_KEY_ENV_VAR, "   ");

    let mut config = TomlConfig::default();
    config.apply_env_overrides().unwrap();
    clear_env();

    assert!(config.services.places_api_key.is_none());
}

#[test]
#[serial]
fn test_invalid_port_env_is_rejected() {
    clear_env();
    env::set_var(PORT_ENV_VAR, "not-a-port");

    let mut config = TomlConfig::default();
    let result = config.apply_env_overrides();
    clear_env();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_config_env_var_points_at_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[server]\nport = 6123\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let (config, source) = load_config(None).unwrap();
    clear_env();

    assert_eq!(config.server.port, 6123);
    assert_eq!(source, ConfigSource::Discovered(path));
}

#[test]
#[serial]
fn test_zero_event_bus_capacity_fails_to_load() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "event_bus_capacity = 0\n").unwrap();

    let result = load_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_env_config_file_is_skipped() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var(CONFIG_ENV_VAR, dir.path().join("gone.toml"));

    let result = load_config(None);
    clear_env();

    let (_, source) = result.unwrap();
    assert_ne!(source, ConfigSource::Discovered(dir.path().join("gone.toml")));
}
