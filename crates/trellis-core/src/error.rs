//! # Trellis Core Errors
//!
//! The crate-wide [`Error`] wraps the typed errors of each subsystem so
//! callers can use `?` across module boundaries.
use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::plugin_system::error::PluginSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),
    /// Loading or parsing manager configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for trellis operations
pub type Result<T> = std::result::Result<T, Error>;
