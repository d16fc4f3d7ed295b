use std::fmt;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;

use crate::plugin_system::descriptor::PluginId;
use crate::plugin_system::manager::ManagerCore;
use crate::plugin_system::settings::PluginSettings;
use crate::plugin_system::traits::{PluginNotification, SharedPlugin};

static MANAGER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a plugin manager, used to key per-manager caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn next() -> Self {
        Self(MANAGER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manager-{}", self.0)
    }
}

/// Non-owning handle to a manager, given to factories
#[derive(Clone)]
pub struct ManagerRef {
    id: ManagerId,
    core: Weak<ManagerCore>,
}

impl ManagerRef {
    pub(crate) fn new(id: ManagerId, core: Weak<ManagerCore>) -> Self {
        Self { id, core }
    }

    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Build a fresh context bound to this manager
    pub fn new_context(&self) -> PluginContext {
        PluginContext {
            manager_id: self.id,
            manager: self.core.clone(),
        }
    }
}

impl fmt::Debug for ManagerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerRef").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Handle a plugin receives on activation.
///
/// Gives read access to other plugins of the owning manager and delivers
/// lifecycle notifications to the plugin it is bound to. Holds only a weak
/// reference to the manager; once the manager is gone every lookup returns
/// nothing.
pub struct PluginContext {
    manager_id: ManagerId,
    manager: Weak<ManagerCore>,
}

impl PluginContext {
    pub fn manager_id(&self) -> ManagerId {
        self.manager_id
    }

    /// Handle to the owning manager, as factories receive it
    pub fn manager_ref(&self) -> ManagerRef {
        ManagerRef::new(self.manager_id, self.manager.clone())
    }

    /// Whether the owning manager still exists
    pub fn is_attached(&self) -> bool {
        self.manager.strong_count() > 0
    }

    /// Instance of another plugin, if it currently has one
    pub fn get_plugin(&self, id: &str) -> Option<SharedPlugin> {
        let core = self.manager.upgrade()?;
        let graph = core.graph.try_borrow().ok()?;
        graph.get_node(id)?.instance().cloned()
    }

    /// Run `f` against another plugin's concrete type.
    ///
    /// Returns `None` if the plugin has no instance, is of a different type,
    /// or is busy running one of its own hooks.
    pub fn get_plugin_as<T, R, F>(&self, id: &str, f: F) -> Option<R>
    where
        T: 'static,
        F: FnOnce(&T) -> R,
    {
        let instance = self.get_plugin(id)?;
        let plugin = instance.try_borrow().ok()?;
        plugin.as_any().downcast_ref::<T>().map(f)
    }

    /// Ids of the currently active plugins, in registration order
    pub fn active_plugins(&self) -> Vec<PluginId> {
        let Some(core) = self.manager.upgrade() else {
            return Vec::new();
        };
        let Ok(graph) = core.graph.try_borrow() else {
            return Vec::new();
        };
        graph
            .nodes()
            .filter(|node| node.is_active())
            .map(|node| node.id().clone())
            .collect()
    }

    /// Settings configured for `id` on the owning manager
    pub fn plugin_settings(&self, id: &str) -> Option<PluginSettings> {
        let core = self.manager.upgrade()?;
        let settings = core.settings.borrow();
        settings.get(id).cloned()
    }

    /// Forward a notification to the plugin bound to this context
    pub(crate) fn deliver(&self, receiver: &SharedPlugin, sender: &PluginId, notification: PluginNotification) {
        match receiver.try_borrow_mut() {
            Ok(mut plugin) => plugin.on_notify(sender, notification),
            Err(_) => warn!(
                "Dropping {} from '{}': receiver is busy in {}",
                notification, sender, self.manager_id
            ),
        }
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("manager_id", &self.manager_id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

