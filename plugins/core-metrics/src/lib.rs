//! Built-in plugin counting the lifecycle notifications it observes.
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, info};
use semver::Version;

use core_logging::{LOGGING_PLUGIN_ID, LoggingPlugin};
use trellis_core::plugin_system::{
    Plugin, PluginContext, PluginDescriptor, PluginError, PluginId, PluginNotification,
};

/// Id under which the metrics plugin registers
pub const METRICS_PLUGIN_ID: PluginId = PluginId::from_static("core-metrics");

#[derive(Debug, Default)]
pub struct MetricsPlugin {
    counts: BTreeMap<&'static str, u64>,
    by_sender: BTreeMap<PluginId, u64>,
    log_level: Option<String>,
}

impl MetricsPlugin {
    /// Descriptor registering this plugin; it requires `core-logging`
    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor::builder(METRICS_PLUGIN_ID)
            .name("Core Metrics")
            .version(Version::new(0, 1, 0))
            .description("Counts plugin lifecycle notifications")
            .requires(LOGGING_PLUGIN_ID)
            .default_constructible::<MetricsPlugin>()
            .build()
    }

    /// Notifications of one kind seen since activation
    pub fn count(&self, notification: PluginNotification) -> u64 {
        self.counts.get(notification.name()).copied().unwrap_or(0)
    }

    /// Notifications sent by `sender` since activation
    pub fn count_from(&self, sender: &str) -> u64 {
        self.by_sender.get(sender).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Level the logging plugin reported when this plugin started
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

impl Plugin for MetricsPlugin {
    fn activate(&mut self, context: &Rc<PluginContext>) -> Result<(), PluginError> {
        let level = context
            .get_plugin_as::<LoggingPlugin, _, _>(LOGGING_PLUGIN_ID.as_str(), |logging| {
                logging.level().to_string()
            })
            .ok_or_else(|| PluginError::ActivationError("core-logging is not running".into()))?;
        info!("Core metrics active, logging at '{}'", level);
        self.log_level = Some(level);
        self.counts.clear();
        self.by_sender.clear();
        Ok(())
    }

    fn deactivate(&mut self, _context: &PluginContext) -> Result<(), PluginError> {
        info!("Core metrics observed {} notification(s)", self.total());
        for (name, count) in &self.counts {
            debug!("  {}: {}", name, count);
        }
        Ok(())
    }

    fn on_notify(&mut self, sender: &PluginId, notification: PluginNotification) {
        *self.counts.entry(notification.name()).or_insert(0) += 1;
        *self.by_sender.entry(sender.clone()).or_insert(0) += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
