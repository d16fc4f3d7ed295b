#![cfg(test)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::config::{ConfigError, ConfigFormat, ManagerConfig, StartupEntry};

const JSON_CONFIG: &str = r#"{
    "accept_unregistered_factory": true,
    "startup": [
        { "plugin": "core-metrics", "cascade": true },
        { "plugin": "audit" }
    ],
    "plugins": {
        "core-logging": { "level": "debug" }
    }
}"#;

#[test]
fn test_format_from_path() {
    assert_eq!(ConfigFormat::from_path(Path::new("trellis.json")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("TRELLIS.JSON")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("trellis.ini")), None);
    assert_eq!(ConfigFormat::from_path(Path::new("trellis")), None);
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_format_from_path_yaml() {
    assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), Some(ConfigFormat::Yaml));
    assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")), Some(ConfigFormat::Yaml));
    assert_eq!(ConfigFormat::Yaml.extension(), "yaml");
}

#[test]
fn test_defaults_when_fields_missing() {
    let config = ManagerConfig::parse("{}", ConfigFormat::Json).unwrap();
    assert_eq!(config, ManagerConfig::default());
    assert!(!config.accept_unregistered_factory);
    assert!(!config.notify_on_register);
    assert!(config.startup.is_empty());
}

#[test]
fn test_parse_json() {
    let config = ManagerConfig::parse(JSON_CONFIG, ConfigFormat::Json).unwrap();
    assert!(config.accept_unregistered_factory);
    assert!(!config.notify_on_register);
    assert_eq!(
        config.startup,
        vec![StartupEntry::new("core-metrics", true), StartupEntry::new("audit", false)]
    );
    let logging = config.plugin_settings("core-logging").unwrap();
    assert_eq!(logging.get::<String>("level").as_deref(), Some("debug"));
    assert!(config.plugin_settings("core-metrics").is_none());
}

#[test]
fn test_parse_error_names_format() {
    let err = ManagerConfig::parse("{ not json", ConfigFormat::Json).unwrap_err();
    match err {
        ConfigError::Parse { format, .. } => assert_eq!(format, "JSON"),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trellis.json");
    fs::write(&path, JSON_CONFIG).unwrap();

    let config = ManagerConfig::load(&path).unwrap();
    assert_eq!(config.startup.len(), 2);
}

#[test]
fn test_load_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trellis.ini");
    fs::write(&path, "accept = true").unwrap();

    let err = ManagerConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = ManagerConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_round_trip_through_file() {
    let config = ManagerConfig::parse(JSON_CONFIG, ConfigFormat::Json).unwrap();
    let text = config.serialize(ConfigFormat::Toml).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("trellis.toml");
    fs::write(&path, text).unwrap();

    assert_eq!(ManagerConfig::load(&path).unwrap(), config);
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_parse_yaml() {
    let yaml = "notify_on_register: true\nstartup:\n  - plugin: core-logging\n";
    let config = ManagerConfig::parse(yaml, ConfigFormat::Yaml).unwrap();
    assert!(config.notify_on_register);
    assert_eq!(config.startup, vec![StartupEntry::new("core-logging", false)]);
}
