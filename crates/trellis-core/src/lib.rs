pub mod config;
pub mod error;
pub mod graph;
pub mod plugin_system;

// Re-export key public types for the binary and plugins
pub use config::{ConfigFormat, ManagerConfig, StartupEntry};
pub use error::{Error, Result};
pub use graph::{DirectedGraph, NodeIndex};
pub use plugin_system::{
    DependencyDeclaration, Plugin, PluginCatalog, PluginContext, PluginDescriptor, PluginError,
    PluginId, PluginManager, PluginNotification, PluginSettings, PluginState, PluginSystemError,
};

#[cfg(test)]
mod tests;
