use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Debug};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::config::{ManagerConfig, StartupEntry};
use crate::error::Result;
use crate::plugin_system::catalog::PluginCatalog;
use crate::plugin_system::context::{ManagerId, PluginContext};
use crate::plugin_system::descriptor::{DependencyDeclaration, PluginDescriptor, PluginId};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::factory::{FactoryId, FactoryRegistry, PluginFactory};
use crate::plugin_system::graph::{PluginGraph, PluginState};
use crate::plugin_system::settings::PluginSettings;
use crate::plugin_system::traits::{PluginNotification, SharedPlugin};

/// State shared between a manager and the contexts it hands out
pub(crate) struct ManagerCore {
    pub(crate) id: ManagerId,
    pub(crate) graph: RefCell<PluginGraph>,
    pub(crate) factories: RefCell<FactoryRegistry>,
    pub(crate) settings: RefCell<BTreeMap<String, PluginSettings>>,
    pub(crate) accept_unregistered_factory: Cell<bool>,
    pub(crate) notify_on_register: Cell<bool>,
}

/// Outcome of one entry of a startup list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStatus {
    /// The plugin is active
    Activated,
    /// The plugin could not be activated yet
    Deferred,
    /// No plugin with that id is registered
    Unknown,
}

impl fmt::Display for StartupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupStatus::Activated => write!(f, "activated"),
            StartupStatus::Deferred => write!(f, "deferred"),
            StartupStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupOutcome {
    pub plugin: PluginId,
    pub status: StartupStatus,
}

/// Registers plugin types and drives their activation and deactivation.
///
/// The manager owns exactly one dependency graph and the factories that build
/// instances. It is single-threaded: all operations run to completion before
/// returning, and plugin hooks run synchronously inside them.
///
/// Dropping the manager deactivates every plugin (see [`PluginManager::dispose_all`]).
pub struct PluginManager {
    core: Rc<ManagerCore>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    /// Create a manager with only the default factory registered
    pub fn new() -> Self {
        Self {
            core: Rc::new(ManagerCore {
                id: ManagerId::next(),
                graph: RefCell::new(PluginGraph::new()),
                factories: RefCell::new(FactoryRegistry::with_default()),
                settings: RefCell::new(BTreeMap::new()),
                accept_unregistered_factory: Cell::new(false),
                notify_on_register: Cell::new(false),
            }),
        }
    }

    /// Create a manager with flags and plugin settings taken from `config`
    pub fn from_config(config: &ManagerConfig) -> Self {
        let manager = Self::new();
        manager.set_accept_unregistered_factory(config.accept_unregistered_factory);
        manager.set_notify_on_register(config.notify_on_register);
        for (plugin_id, settings) in &config.plugins {
            manager.set_plugin_settings(plugin_id, settings.clone());
        }
        manager
    }

    pub fn id(&self) -> ManagerId {
        self.core.id
    }

    /// Whether a factory a plugin names but nobody registered may be created on demand
    pub fn accept_unregistered_factory(&self) -> bool {
        self.core.accept_unregistered_factory.get()
    }

    pub fn set_accept_unregistered_factory(&self, accept: bool) {
        self.core.accept_unregistered_factory.set(accept);
    }

    /// Whether registrations are broadcast as [`PluginNotification::Registered`]
    pub fn notify_on_register(&self) -> bool {
        self.core.notify_on_register.get()
    }

    pub fn set_notify_on_register(&self, notify: bool) {
        self.core.notify_on_register.set(notify);
    }

    /// Settings plugins can read for `plugin_id` through their context
    pub fn set_plugin_settings(&self, plugin_id: &str, settings: PluginSettings) {
        self.core.settings.borrow_mut().insert(plugin_id.to_string(), settings);
    }

    pub fn plugin_settings(&self, plugin_id: &str) -> Option<PluginSettings> {
        self.core.settings.borrow().get(plugin_id).cloned()
    }

    /// Register a plugin type and wire whatever dependencies are now available
    pub fn register(&self, descriptor: PluginDescriptor) -> Result<()> {
        let id = descriptor.id().clone();
        {
            let mut graph = self.core.graph.borrow_mut();
            graph.add_node(descriptor)?;
            if graph.is_on_cycle(&id) {
                warn!("Plugin '{}' is part of a dependency cycle and cannot be activated", id);
            }
        }
        info!("Registered plugin '{}'", id);

        if self.core.notify_on_register.get() {
            self.core.notify_plugins(&id, PluginNotification::Registered);
        }
        Ok(())
    }

    /// Register every descriptor of a catalog in order.
    ///
    /// A failing entry does not stop the remaining ones.
    pub fn register_catalog(&self, catalog: &PluginCatalog) -> Vec<(PluginId, Result<()>)> {
        catalog
            .iter()
            .map(|descriptor| (descriptor.id().clone(), self.register(descriptor.clone())))
            .collect()
    }

    /// Make a factory available under `id` before any plugin asks for it
    pub fn register_factory(&self, id: FactoryId, factory: Rc<dyn PluginFactory>) -> Result<()> {
        if !self.core.factories.borrow_mut().insert(id.clone(), factory) {
            return Err(PluginSystemError::DuplicateFactory {
                factory_id: id.to_string(),
            }
            .into());
        }
        debug!("Registered plugin factory '{}'", id);
        Ok(())
    }

    /// Ids of the factories this manager holds, in the order they were added
    pub fn factory_ids(&self) -> Vec<FactoryId> {
        self.core.factories.borrow().ids()
    }

    fn require(&self, id: &str) -> Result<PluginId> {
        self.core
            .graph
            .borrow()
            .get_node(id)
            .map(|node| node.id().clone())
            .ok_or_else(|| {
                PluginSystemError::UnknownPlugin {
                    plugin_id: id.to_string(),
                }
                .into()
            })
    }

    /// Activate a plugin.
    ///
    /// With `cascade` the plugin's dependencies are activated first as needed;
    /// without it every dependency must already be active. `Ok(false)` means
    /// "not now": a dependency is missing or inactive, no factory could be
    /// resolved, or the instance could not be built or refused to start.
    pub fn activate(&self, id: &str, cascade: bool) -> Result<bool> {
        let id = self.require(id)?;
        Ok(self.core.activate_node(&id, cascade, &mut HashSet::new()))
    }

    /// Deactivate a plugin.
    ///
    /// Plugins that depend on it must be inactive first. With `cascade` they
    /// are deactivated recursively; without it the call returns `Ok(false)`
    /// while any of them is still active.
    pub fn deactivate(&self, id: &str, cascade: bool) -> Result<bool> {
        let id = self.require(id)?;
        Ok(self.core.deactivate_node(&id, cascade, &mut HashSet::new()))
    }

    /// Activate the entries of a startup list in order
    pub fn activate_startup(&self, entries: &[StartupEntry]) -> Vec<StartupOutcome> {
        entries
            .iter()
            .map(|entry| {
                let status = match self.activate(&entry.plugin, entry.cascade) {
                    Ok(true) => StartupStatus::Activated,
                    Ok(false) => StartupStatus::Deferred,
                    Err(e) => {
                        warn!("Skipping startup entry '{}': {}", entry.plugin, e);
                        StartupStatus::Unknown
                    }
                };
                StartupOutcome {
                    plugin: PluginId::new(entry.plugin.clone()),
                    status,
                }
            })
            .collect()
    }

    /// The running instance of a plugin, if any
    pub fn get_plugin(&self, id: &str) -> Option<SharedPlugin> {
        self.core.graph.borrow().get_node(id)?.instance().cloned()
    }

    /// The context a running plugin was activated with
    pub fn context_of(&self, id: &str) -> Option<Rc<PluginContext>> {
        self.core.graph.borrow().get_node(id)?.context().cloned()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.core.is_active(id)
    }

    pub fn state(&self, id: &str) -> Option<PluginState> {
        self.core.graph.borrow().get_node(id).map(|node| node.state())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.core.graph.borrow().contains(id)
    }

    /// Registered plugin ids in registration order
    pub fn registered_plugins(&self) -> Vec<PluginId> {
        self.core.graph.borrow().ids()
    }

    pub fn descriptor(&self, id: &str) -> Option<PluginDescriptor> {
        self.core
            .graph
            .borrow()
            .get_node(id)
            .map(|node| node.descriptor().clone())
    }

    /// Human-readable name of a registered plugin
    pub fn plugin_name(&self, id: &str) -> Result<String> {
        let graph = self.core.graph.borrow();
        let node = graph.get_node(id).ok_or_else(|| PluginSystemError::UnknownPlugin {
            plugin_id: id.to_string(),
        })?;
        Ok(node.descriptor().name()?.to_string())
    }

    /// Hard dependencies of `id` that are not registered yet
    pub fn missing_dependencies(&self, id: &str) -> Vec<DependencyDeclaration> {
        self.core
            .graph
            .borrow()
            .get_node(id)
            .map(|node| node.missing_dependencies().to_vec())
            .unwrap_or_default()
    }

    /// Registered plugins `id` depends on
    pub fn dependencies_of(&self, id: &str) -> Vec<PluginId> {
        self.core.graph.borrow().predecessors(id)
    }

    /// Registered plugins that depend on `id`
    pub fn dependents_of(&self, id: &str) -> Vec<PluginId> {
        self.core.graph.borrow().successors(id)
    }

    /// Every resolved edge as `(dependency, dependent)`
    pub fn edges(&self) -> Vec<(PluginId, PluginId)> {
        self.core.graph.borrow().edges()
    }

    /// Ids of the currently active plugins in registration order
    pub fn active_plugins(&self) -> Vec<PluginId> {
        self.core
            .graph
            .borrow()
            .nodes()
            .filter(|node| node.is_active())
            .map(|node| node.id().clone())
            .collect()
    }

    /// Deactivate every registered plugin, dependents first.
    ///
    /// Plugins are visited in registration order and torn down with cascade,
    /// so a dependency chain is released leaf to root.
    pub fn dispose_all(&self) {
        let ids = self.core.graph.borrow().ids();
        for id in ids {
            if !self.core.deactivate_node(&id, true, &mut HashSet::new()) {
                warn!("Plugin '{}' could not be deactivated during disposal", id);
            }
        }
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("id", &self.core.id)
            .field("plugins", &self.core.graph.try_borrow().map(|g| g.len()).ok())
            .field("accept_unregistered_factory", &self.core.accept_unregistered_factory.get())
            .finish_non_exhaustive()
    }
}
