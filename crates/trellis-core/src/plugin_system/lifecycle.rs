//! Activation and deactivation of plugin nodes.
//!
//! The graph is never borrowed while plugin code runs: state is read under a
//! short borrow, released, and only then are hooks invoked. Hooks may
//! therefore query the manager through their context.
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::plugin_system::context::ManagerRef;
use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::factory::PluginFactory;
use crate::plugin_system::graph::PluginNode;
use crate::plugin_system::manager::ManagerCore;
use crate::plugin_system::traits::{PluginNotification, SharedPlugin};

impl ManagerCore {
    pub(crate) fn manager_ref(self: &Rc<Self>) -> ManagerRef {
        ManagerRef::new(self.id, Rc::downgrade(self))
    }

    pub(crate) fn is_active(&self, id: &str) -> bool {
        self.graph
            .borrow()
            .get_node(id)
            .is_some_and(PluginNode::is_active)
    }

    fn with_node<R>(&self, id: &str, f: impl FnOnce(&mut PluginNode) -> R) -> Option<R> {
        self.graph.borrow_mut().get_node_mut(id).map(f)
    }

    /// Activate `id`, optionally pulling its dependencies up first.
    ///
    /// `in_progress` holds the nodes currently being activated further up the
    /// call chain; meeting one of them again means a cycle.
    pub(crate) fn activate_node(
        self: &Rc<Self>,
        id: &PluginId,
        cascade: bool,
        in_progress: &mut HashSet<PluginId>,
    ) -> bool {
        let dependencies = {
            let graph = self.graph.borrow();
            let Some(node) = graph.get_node(id) else {
                return false;
            };
            if !node.missing_dependencies().is_empty() {
                let missing: Vec<String> = node
                    .missing_dependencies()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                warn!("Cannot activate '{}': {}", id, missing.join(", "));
                return false;
            }
            if node.is_active() {
                return true;
            }
            graph.predecessors(id)
        };

        if !in_progress.insert(id.clone()) {
            warn!("Cannot activate '{}': dependency cycle detected", id);
            return false;
        }
        let activated = self.activate_with_dependencies(id, &dependencies, cascade, in_progress);
        in_progress.remove(id);
        activated
    }

    fn activate_with_dependencies(
        self: &Rc<Self>,
        id: &PluginId,
        dependencies: &[PluginId],
        cascade: bool,
        in_progress: &mut HashSet<PluginId>,
    ) -> bool {
        for dependency in dependencies {
            let ready = if cascade {
                self.activate_node(dependency, true, in_progress)
            } else {
                self.is_active(dependency)
            };
            if !ready {
                warn!("Cannot activate '{}': dependency '{}' is not active", id, dependency);
                return false;
            }
        }
        self.start_instance(id)
    }

    /// Build, announce and start the instance of a node whose dependencies are all active
    fn start_instance(self: &Rc<Self>, id: &PluginId) -> bool {
        let Some(descriptor) = self.graph.borrow().get_node(id).map(|node| node.descriptor().clone()) else {
            return false;
        };
        let Some(factory) = self.resolve_factory(&descriptor) else {
            return false;
        };
        let Some(plugin) = factory.create_plugin_instance(&descriptor) else {
            warn!("Factory '{}' produced no instance for '{}'", descriptor.factory_id(), id);
            return false;
        };

        let instance: SharedPlugin = Rc::new(RefCell::new(plugin));
        self.with_node(id, |node| node.set_instance(instance.clone()));
        self.notify_plugins(id, PluginNotification::Created);

        let context = factory.create_plugin_context(&self.manager_ref(), id);
        let started = match instance.try_borrow_mut() {
            Ok(mut plugin) => plugin.activate(&context).map_err(|e| e.to_string()),
            Err(_) => Err("instance is borrowed elsewhere".to_string()),
        };
        if let Err(e) = started {
            warn!("Plugin '{}' failed to activate: {}", id, e);
            self.dispose_instance(id, &instance);
            self.notify_plugins(id, PluginNotification::Disposed);
            self.with_node(id, PluginNode::release);
            return false;
        }

        self.with_node(id, |node| node.mark_active(context));
        info!("Activated plugin '{}'", id);
        self.notify_plugins(id, PluginNotification::Activated);
        true
    }

    /// Deactivate `id` once nothing that depends on it is running
    pub(crate) fn deactivate_node(
        self: &Rc<Self>,
        id: &PluginId,
        cascade: bool,
        in_progress: &mut HashSet<PluginId>,
    ) -> bool {
        let dependents = {
            let graph = self.graph.borrow();
            let Some(node) = graph.get_node(id) else {
                return false;
            };
            if !node.is_active() {
                return true;
            }
            if node.instance().is_some_and(|instance| instance.try_borrow_mut().is_err()) {
                warn!("Cannot deactivate '{}': its instance is borrowed elsewhere", id);
                return false;
            }
            graph.successors(id)
        };

        if !in_progress.insert(id.clone()) {
            warn!("Cannot deactivate '{}': dependency cycle detected", id);
            return false;
        }
        let deactivated = self.deactivate_with_dependents(id, &dependents, cascade, in_progress);
        in_progress.remove(id);
        deactivated
    }

    fn deactivate_with_dependents(
        self: &Rc<Self>,
        id: &PluginId,
        dependents: &[PluginId],
        cascade: bool,
        in_progress: &mut HashSet<PluginId>,
    ) -> bool {
        for dependent in dependents {
            let released = if cascade {
                self.deactivate_node(dependent, true, in_progress)
            } else {
                !self.is_active(dependent)
            };
            if !released {
                warn!("Cannot deactivate '{}': '{}' still depends on it", id, dependent);
                return false;
            }
        }
        self.stop_instance(id)
    }

    fn stop_instance(&self, id: &PluginId) -> bool {
        let bound = self
            .graph
            .borrow()
            .get_node(id)
            .and_then(|node| Some((node.instance()?.clone(), node.context()?.clone())));
        let Some((instance, context)) = bound else {
            return false;
        };

        let stopped = match instance.try_borrow_mut() {
            Ok(mut plugin) => plugin.deactivate(&context),
            Err(_) => {
                warn!("Cannot deactivate '{}': its instance is borrowed elsewhere", id);
                return false;
            }
        };
        if let Err(e) = stopped {
            warn!("Plugin '{}' failed to deactivate cleanly, tearing down anyway: {}", id, e);
        }
        self.with_node(id, PluginNode::mark_inactive);
        self.notify_plugins(id, PluginNotification::Deactivated);

        self.dispose_instance(id, &instance);
        self.notify_plugins(id, PluginNotification::Disposed);
        self.with_node(id, PluginNode::release);
        info!("Deactivated plugin '{}'", id);
        true
    }

    /// Past the point of no return: a busy instance is released undisposed
    fn dispose_instance(&self, id: &PluginId, instance: &SharedPlugin) {
        match instance.try_borrow_mut() {
            Ok(mut plugin) => plugin.dispose(),
            Err(_) => warn!("Plugin '{}' is borrowed elsewhere and was released without disposal", id),
        }
    }

    /// Factory for `descriptor`, creating an unregistered one if allowed
    fn resolve_factory(&self, descriptor: &PluginDescriptor) -> Option<Rc<dyn PluginFactory>> {
        let factory_id = descriptor.factory_id();
        if let Some(factory) = self.factories.borrow().get(&factory_id) {
            return Some(factory);
        }
        if !self.accept_unregistered_factory.get() {
            warn!(
                "Plugin '{}' needs unregistered factory '{}' and on-demand factories are disabled",
                descriptor.id(),
                factory_id
            );
            return None;
        }
        let Some(factory_ref) = descriptor.factory() else {
            warn!("Plugin '{}' names no factory to create", descriptor.id());
            return None;
        };

        let factory = factory_ref.instantiate();
        self.factories.borrow_mut().insert(factory_id.clone(), factory.clone());
        debug!("Created plugin factory '{}' on demand for '{}'", factory_id, descriptor.id());
        Some(factory)
    }

    /// Send `notification` to every active plugin except `sender`
    pub(crate) fn notify_plugins(&self, sender: &PluginId, notification: PluginNotification) {
        let subscribers = self.graph.borrow().subscribers(sender);
        for subscriber in subscribers {
            debug!("Delivering {} from '{}' to '{}'", notification, sender, subscriber.id);
            subscriber
                .context
                .deliver(&subscriber.instance, sender, notification);
        }
    }
}
