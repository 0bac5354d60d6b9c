//! Tests for configuration loading and validation.

use crate::config::VezaConfig;
use crate::error::Error;
use crate::graph::LoadMode;
use std::io::Write;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_defaults() {
    let config = VezaConfig::default();
    assert_eq!(config.search.port, 8080);
    assert_eq!(config.search.ef, 200);
    assert_eq!(config.search.k, 10);
    assert_eq!(config.search.dim, 128);
    assert!(!config.search.optimized);
    assert_eq!(config.search.load_mode(), LoadMode::Resident);
    assert_eq!(config.storage.port, 8081);
    assert!(config.validate().is_ok());
}

#[test]
fn test_client_options_derivation() {
    let config = VezaConfig::default();
    let options = config.search.client_options();
    assert_eq!(options.max_retries, 3);
    assert_eq!(options.backoff, Duration::from_millis(100));
    assert_eq!(options.connect_timeout, Duration::from_secs(5));
    assert_eq!(options.request_timeout, Duration::from_secs(10));
}

#[test]
fn test_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("veza.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[search]
graph = "/data/graph.bin"
dim = 768
optimized = true
entry = 17

[storage]
port = 9000
"#
    )
    .unwrap();

    let config = VezaConfig::load_from(&path).unwrap();
    assert_eq!(config.search.graph, "/data/graph.bin");
    assert_eq!(config.search.dim, 768);
    assert_eq!(config.search.entry, Some(17));
    assert_eq!(config.search.load_mode(), LoadMode::Lazy);
    assert_eq!(config.storage.port, 9000);
    // Untouched keys keep their defaults.
    assert_eq!(config.search.ef, 200);
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = VezaConfig::load_from("/nonexistent/veza.toml").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_zero_dim_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("veza.toml");
    std::fs::write(&path, "[search]\ndim = 0\n").unwrap();

    let err = VezaConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("dim"));
}

#[test]
fn test_env_override() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("VEZA_SEARCH__EF", "64");
        jail.set_env("VEZA_STORAGE__PORT", "7000");
        let config = VezaConfig::load().expect("load");
        assert_eq!(config.search.ef, 64);
        assert_eq!(config.storage.port, 7000);
        Ok(())
    });
}
