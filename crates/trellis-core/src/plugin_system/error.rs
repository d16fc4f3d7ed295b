//! # Trellis Plugin System Errors
//!
//! Structural and configuration violations raised by the plugin system.
//!
//! Only programmer errors end up here: registering the same plugin twice,
//! querying metadata a plugin never declared, addressing a plugin that was
//! never registered, or registering two factories under one id. Expected
//! lifecycle outcomes (a dependency is not active yet, no factory could be
//! resolved, construction produced nothing) are reported as `Ok(false)` by
//! the manager instead.
// crates/trellis-core/src/plugin_system/error.rs

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin '{plugin_id}' already registered")]
    DuplicateRegistration { plugin_id: String },

    #[error("Plugin '{plugin_id}' declares no {field}")]
    MissingMetadata {
        plugin_id: String,
        field: &'static str,
    },

    #[error("Plugin '{plugin_id}' is not registered")]
    UnknownPlugin { plugin_id: String },

    #[error("Plugin factory '{factory_id}' already registered")]
    DuplicateFactory { factory_id: String },
}
