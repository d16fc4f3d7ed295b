//! Built-in plugin installing the process-wide log subscriber.
//!
//! Every `log` record emitted by the plugin system is bridged into `tracing`
//! and printed to stderr once this plugin is active.
use std::any::Any;
use std::rc::Rc;

use log::info;
use semver::Version;
use tracing_subscriber::EnvFilter;

use trellis_core::plugin_system::{
    Plugin, PluginContext, PluginDescriptor, PluginError, PluginId, PluginSettings,
};

/// Id under which the logging plugin registers
pub const LOGGING_PLUGIN_ID: PluginId = PluginId::from_static("core-logging");

const DEFAULT_LEVEL: &str = "info";

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

// Define the main plugin struct
#[derive(Debug)]
pub struct LoggingPlugin {
    settings: PluginSettings,
    level: String,
    format: LogFormat,
    installed: bool,
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self {
            settings: PluginSettings::new(),
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::Text,
            installed: false,
        }
    }
}

impl LoggingPlugin {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Whether this instance installed the global subscriber
    pub fn installed(&self) -> bool {
        self.installed
    }

    /// Descriptor registering this plugin with the default factory
    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor::builder(LOGGING_PLUGIN_ID)
            .name("Core Logging")
            .version(Version::new(0, 1, 0))
            .description("Routes log records to stderr")
            .default_constructible::<LoggingPlugin>()
            .build()
    }

    fn apply_settings(&mut self, context: &PluginContext) -> Result<(), PluginError> {
        if let Some(settings) = context.plugin_settings(LOGGING_PLUGIN_ID.as_str()) {
            self.settings.merge(&settings);
        }
        let format = self.settings.get_or("format", "text".to_string());
        self.format = LogFormat::parse(&format)
            .ok_or_else(|| PluginError::SettingsError(format!("Unknown log format '{}'", format)))?;
        self.level = self.settings.get_or("level", DEFAULT_LEVEL.to_string());
        Ok(())
    }

    /// Install the subscriber. Fails if another one is already in place.
    fn install(&self) -> Result<(), String> {
        tracing_log::LogTracer::init().map_err(|e| e.to_string())?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        let result = match self.format {
            LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
            LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        };
        result.map_err(|e| e.to_string())
    }
}

impl Plugin for LoggingPlugin {
    fn activate(&mut self, context: &Rc<PluginContext>) -> Result<(), PluginError> {
        self.apply_settings(context)?;
        match self.install() {
            Ok(()) => {
                self.installed = true;
                info!("Core logging active at level '{}'", self.level);
            }
            // A second manager in the same process finds the subscriber in place
            Err(e) => info!("Log subscriber already installed, keeping it: {}", e),
        }
        Ok(())
    }

    fn deactivate(&mut self, _context: &PluginContext) -> Result<(), PluginError> {
        info!("Shutting down Core Logging Plugin");
        Ok(())
    }

    fn settings(&self) -> Option<&PluginSettings> {
        Some(&self.settings)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
