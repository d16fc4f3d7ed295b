#![cfg(test)]

use semver::Version;

use crate::plugin_system::descriptor::{DependencyDeclaration, PluginDescriptor, PluginId};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::factory::FactoryId;

use super::common::{mock_descriptor, tracker};

#[test]
fn test_builder_metadata() {
    let descriptor = PluginDescriptor::builder("audit")
        .name("Audit Trail")
        .version(Version::new(1, 2, 0))
        .description("Records lifecycle events")
        .requires("core-logging")
        .optionally_requires("core-metrics")
        .build();

    assert_eq!(descriptor.id().as_str(), "audit");
    assert_eq!(descriptor.name().unwrap(), "Audit Trail");
    assert_eq!(descriptor.version(), Some(&Version::new(1, 2, 0)));
    assert_eq!(descriptor.description(), Some("Records lifecycle events"));
    assert_eq!(descriptor.dependencies().len(), 2);
    assert!(descriptor.requires("core-logging"));
    assert!(descriptor.requires("core-metrics"));
    assert!(!descriptor.requires("audit"));

    let required: Vec<&str> = descriptor
        .required_dependencies()
        .map(|dep| dep.plugin_id.as_str())
        .collect();
    assert_eq!(required, vec!["core-logging"]);
}

#[test]
fn test_missing_name_is_an_error() {
    let descriptor = PluginDescriptor::builder("nameless").build();
    match descriptor.name() {
        Err(PluginSystemError::MissingMetadata { plugin_id, field }) => {
            assert_eq!(plugin_id, "nameless");
            assert_eq!(field, "name");
        }
        other => panic!("Expected MissingMetadata, got {:?}", other),
    }
}

#[test]
fn test_dependency_display() {
    assert_eq!(
        DependencyDeclaration::required("core-logging").to_string(),
        "Requires plugin: core-logging"
    );
    assert_eq!(
        DependencyDeclaration::optional("core-metrics").to_string(),
        "Optional plugin: core-metrics"
    );
}

#[test]
fn test_default_factory_route() {
    let descriptor = PluginDescriptor::builder("plain").build();
    assert!(descriptor.factory().is_none());
    assert_eq!(descriptor.factory_id(), FactoryId::DEFAULT);
}

#[test]
fn test_construct_without_constructor() {
    let descriptor = PluginDescriptor::builder("abstract").name("Abstract").build();
    assert!(descriptor.construct().is_none());
}

#[test]
fn test_construct_builds_fresh_instances() {
    let log = tracker();
    let descriptor = mock_descriptor("worker", &[], &log);
    assert!(descriptor.construct().is_some());
    assert!(descriptor.construct().is_some());
    // Construction alone runs no hooks
    assert!(log.borrow().is_empty());
}

#[test]
fn test_plugin_id_conversions() {
    const STATIC_ID: PluginId = PluginId::from_static("core-logging");
    let owned = PluginId::new(String::from("core-logging"));
    assert_eq!(STATIC_ID, owned);
    assert_eq!(owned.to_string(), "core-logging");
    assert_eq!(PluginId::from("a"), PluginId::new("a"));
}
