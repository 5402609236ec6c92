use sitekeeper::backend::factory::create_store;
use sitekeeper::config::Config;
use sitekeeper::constants::{DEFAULT_POLL_INTERVAL_SECS, FIRESTORE_DEFAULT_DATABASE};
use std::time::Duration;

fn memory_config() -> Config {
    let mut config = Config::default();
    config.remote.store_type = "memory".to_string();
    config
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.remote.store_type, "firestore");
    assert_eq!(config.remote.database, FIRESTORE_DEFAULT_DATABASE);
    assert_eq!(config.connectivity.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    assert_eq!(config.connectivity.probe_timeout(), Duration::from_secs(5));
    assert!(config.cache.database_url.starts_with("sqlite://"));
    assert!(!config.logging.enabled);
}

#[test]
fn test_default_firestore_config_requires_project() {
    let mut config = Config::default();

    // Firestore without a project id is rejected
    assert!(config.validate().is_err());

    config.remote.project_id = "team-site".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let mut config = memory_config();
    assert!(config.validate().is_ok());

    // Probe timeout must be shorter than the poll interval
    config.connectivity.probe_timeout_secs = 30;
    assert!(config.validate().is_err());

    // Reset and test invalid poll interval
    config.connectivity.probe_timeout_secs = 5;
    config.connectivity.poll_interval_secs = 0;
    assert!(config.validate().is_err());

    config.connectivity.poll_interval_secs = 30;
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "debug".to_string();
    config.remote.store_type = "ftp".to_string();
    assert!(config.validate().is_err());

    config.remote.store_type = "rest".to_string();
    config.remote.base_url = String::new();
    assert!(config.validate().is_err());

    config.remote.base_url = "http://localhost:3001".to_string();
    assert!(config.validate().is_ok());

    config.cache.database_url = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_rest_store_requires_its_own_base_url() {
    let config: Config = toml::from_str("[remote]\nstore_type = \"rest\"\n").unwrap();
    assert!(config.remote.base_url.is_empty());
    assert!(config.validate().is_err());
    assert!(create_store(&config.remote).is_err());
}

#[test]
fn test_firestore_store_uses_public_endpoint_by_default() {
    let mut config = Config::default();
    config.remote.project_id = "team-site".to_string();
    assert!(config.remote.base_url.is_empty());
    assert!(config.validate().is_ok());

    let store = create_store(&config.remote).unwrap();
    assert_eq!(store.store_type(), "firestore");
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("store_type = \"firestore\""));
    assert!(toml_str.contains("poll_interval_secs = 30"));
    assert!(toml_str.contains("[cache]"));
}

#[test]
fn test_partial_config_deserialization() {
    // Partial TOML configs merge with defaults
    let partial_toml = r#"
[remote]
store_type = "rest"
base_url = "http://localhost:3001"

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    assert_eq!(config.remote.store_type, "rest");
    assert!(config.logging.enabled);

    assert_eq!(config.remote.request_timeout_secs, 10); // default value
    assert_eq!(config.connectivity.probe_timeout_secs, 5); // default value
    assert_eq!(config.logging.level, "info"); // default value
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.remote.store_type, default_config.remote.store_type);
    assert_eq!(config.cache.database_url, default_config.cache.database_url);
    assert_eq!(
        config.connectivity.poll_interval_secs,
        default_config.connectivity.poll_interval_secs
    );
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitekeeper.toml");
    std::fs::write(
        &path,
        r#"
[remote]
store_type = "firestore"
project_id = "team-site"

[connectivity]
poll_interval_secs = 60
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.remote.project_id, "team-site");
    assert_eq!(config.connectivity.poll_interval(), Duration::from_secs(60));
}

#[test]
fn test_load_from_file_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitekeeper.toml");
    std::fs::write(&path, "[remote]\nstore_type = \"rest\"\nbase_url = \"\"\n").unwrap();

    assert!(Config::load_from_file(&path).is_err());
    assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_generate_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# Sitekeeper Configuration File"));
    let parsed: Config = toml::from_str(&content).unwrap();
    assert_eq!(parsed.remote.store_type, "firestore");
}

#[test]
fn test_api_key_from_environment() {
    let mut config = memory_config();
    config.remote.api_key_env = "SITEKEEPER_TEST_API_KEY_UNSET".to_string();
    assert_eq!(config.remote.api_key(), None);

    config.remote.api_key_env = String::new();
    assert_eq!(config.remote.api_key(), None);
}
