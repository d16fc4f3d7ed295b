use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Per-plugin key/value settings.
///
/// Values are kept as JSON values so the same settings can come from any of
/// the supported configuration formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginSettings {
    values: BTreeMap<String, serde_json::Value>,
}

impl PluginSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a setting, if present and of the requested type
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a setting with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a setting
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> serde_json::Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.values.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Builder-style variant of [`PluginSettings::set`]
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> serde_json::Result<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge with other settings, overriding existing values
    pub fn merge(&mut self, other: &PluginSettings) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }
}
