#![cfg(test)]

use std::fs;

use tempfile::tempdir;

use crate::config::ManagerConfig;
use crate::plugin_system::{PluginDescriptor, PluginManager, StartupStatus};
use crate::plugin_system::tests::common::{MockPlugin, mock_descriptor, tracker};

#[test]
fn test_manager_built_from_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trellis.json");
    fs::write(
        &path,
        r#"{
            "startup": [
                { "plugin": "core-metrics", "cascade": true },
                { "plugin": "worker" }
            ],
            "plugins": { "core-logging": { "level": "warn" } }
        }"#,
    )
    .unwrap();
    let config = ManagerConfig::load(&path).unwrap();

    let log = tracker();
    let manager = PluginManager::from_config(&config);
    manager.register(mock_descriptor("core-logging", &[], &log)).unwrap();
    manager.register(mock_descriptor("core-metrics", &["core-logging"], &log)).unwrap();
    let worker_log = log.clone();
    manager
        .register(
            PluginDescriptor::builder("worker")
                .name("Worker")
                .constructor(move || MockPlugin::new("worker", &worker_log).failing_activation())
                .build(),
        )
        .unwrap();

    let outcomes = manager.activate_startup(&config.startup);
    let statuses: Vec<StartupStatus> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(statuses, vec![StartupStatus::Activated, StartupStatus::Deferred]);
    assert_eq!(
        manager
            .plugin_settings("core-logging")
            .and_then(|settings| settings.get::<String>("level")),
        Some("warn".to_string())
    );
}
