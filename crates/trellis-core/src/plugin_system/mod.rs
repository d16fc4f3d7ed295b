//! # Trellis Plugin System
//!
//! Registration, dependency resolution and lifecycle management for plugins.
//! Plugin types are described by a [`PluginDescriptor`], registered with a
//! [`PluginManager`], and activated once every plugin they depend on is
//! running.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: Plugin identity and metadata ([`PluginDescriptor`]),
//!   including dependency declarations and the factory a plugin asks for.
//! - **[`traits`]**: The [`Plugin`] trait every plugin implements, the
//!   [`PluginNotification`] kinds, and the plugin-facing [`PluginError`].
//! - **[`graph`]**: The dependency graph ([`PluginGraph`]) with one node per
//!   registered plugin type.
//! - **[`factory`]**: [`PluginFactory`] implementations that build instances
//!   and memoise one [`PluginContext`] per manager.
//! - **[`context`]**: The handle ([`PluginContext`]) a running plugin uses to
//!   reach other plugins of its manager.
//! - **[`manager`]**: The [`PluginManager`] facade driving activation and
//!   deactivation.
//! - **[`catalog`]**: Ordered collections of descriptors registered together.
//! - **[`settings`]**: Per-plugin key/value settings.
//! - **[`error`]**: Structural errors ([`PluginSystemError`]).
pub mod catalog;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod graph;
mod lifecycle;
pub mod manager;
pub mod settings;
pub mod traits;

pub use catalog::PluginCatalog;
pub use context::{ManagerId, ManagerRef, PluginContext};
pub use descriptor::{DependencyDeclaration, FactoryRef, PluginDescriptor, PluginId};
pub use error::PluginSystemError;
pub use factory::{ContextCache, DefaultPluginFactory, FactoryId, PluginFactory};
pub use graph::{PluginGraph, PluginNode, PluginState};
pub use manager::{PluginManager, StartupOutcome, StartupStatus};
pub use settings::PluginSettings;
pub use traits::{Plugin, PluginError, PluginNotification, SharedPlugin};

// Test module declaration
#[cfg(test)]
pub(crate) mod tests;
