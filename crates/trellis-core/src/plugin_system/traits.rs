use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::plugin_system::context::PluginContext;
use crate::plugin_system::descriptor::PluginId;
use crate::plugin_system::settings::PluginSettings;

/// Lifecycle notifications broadcast to active plugins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginNotification {
    /// A plugin type was registered. Only sent when the manager opts in.
    Registered,
    /// An instance was constructed and is about to be activated
    Created,
    /// An instance finished its activation hook
    Activated,
    /// An instance finished its deactivation hook
    Deactivated,
    /// An instance was disposed and released
    Disposed,
}

impl PluginNotification {
    /// Get the event name of this notification
    pub fn name(&self) -> &'static str {
        match self {
            PluginNotification::Registered => "plugin.registered",
            PluginNotification::Created => "plugin.created",
            PluginNotification::Activated => "plugin.activated",
            PluginNotification::Deactivated => "plugin.deactivated",
            PluginNotification::Disposed => "plugin.disposed",
        }
    }
}

impl fmt::Display for PluginNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type returned by plugin hooks
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin activation error: {0}")]
    ActivationError(String),
    #[error("Plugin deactivation error: {0}")]
    DeactivationError(String),
    #[error("Plugin settings error: {0}")]
    SettingsError(String),
}

/// Core trait that all plugins must implement.
///
/// The manager only ever calls the four lifecycle hooks; everything else about
/// a plugin is opaque to it.
pub trait Plugin: Any {
    /// Called once per activation with the context shared by every plugin
    /// the same factory serves. Returning an error aborts the activation.
    fn activate(&mut self, context: &Rc<PluginContext>) -> Result<(), PluginError>;

    /// Called before the instance is released
    fn deactivate(&mut self, context: &PluginContext) -> Result<(), PluginError>;

    /// Receives lifecycle notifications about other plugins while active.
    /// The default implementation ignores them.
    fn on_notify(&mut self, _sender: &PluginId, _notification: PluginNotification) {}

    /// Release resources. Called after deactivation, before the instance is dropped.
    fn dispose(&mut self) {}

    /// Settings this instance currently runs with
    fn settings(&self) -> Option<&PluginSettings> {
        None
    }

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// A live plugin instance as owned by its graph node
pub type SharedPlugin = Rc<RefCell<Box<dyn Plugin>>>;
