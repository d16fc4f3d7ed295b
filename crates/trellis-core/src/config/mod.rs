//! # Trellis Manager Configuration
//!
//! [`ManagerConfig`] carries the manager flags, a startup list and per-plugin
//! settings. It can be loaded from JSON, and from YAML or TOML when the
//! `yaml-config` / `toml-config` features are enabled. The format is picked
//! from the file extension.
pub mod error;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::plugin_system::settings::PluginSettings;

pub use error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// One plugin to activate at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupEntry {
    pub plugin: String,
    /// Activate the plugin's dependencies as well
    #[serde(default)]
    pub cascade: bool,
}

impl StartupEntry {
    pub fn new(plugin: impl Into<String>, cascade: bool) -> Self {
        Self {
            plugin: plugin.into(),
            cascade,
        }
    }
}

/// Settings for a [`PluginManager`](crate::plugin_system::PluginManager)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Create factories that plugins name but nobody registered
    pub accept_unregistered_factory: bool,
    /// Broadcast a notification when a plugin type is registered
    pub notify_on_register: bool,
    /// Plugins to activate, in order
    pub startup: Vec<StartupEntry>,
    /// Settings by plugin id
    pub plugins: BTreeMap<String, PluginSettings>,
}

impl ManagerConfig {
    /// Read and parse a config file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loading manager config from {}", path.display());
        Self::parse(&data, format)
    }

    /// Parse config text in the given format
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
        }
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                format: "JSON",
                message: e.to_string(),
            }),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize {
                format: "YAML",
                message: e.to_string(),
            }),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
                format: "TOML",
                message: e.to_string(),
            }),
        }
    }

    /// Settings configured for `plugin_id`
    pub fn plugin_settings(&self, plugin_id: &str) -> Option<&PluginSettings> {
        self.plugins.get(plugin_id)
    }
}

#[cfg(test)]
mod tests;
