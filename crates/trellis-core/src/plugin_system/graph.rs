//! The plugin dependency graph.
//!
//! One [`PluginNode`] per registered plugin type. Edges always point from a
//! dependency to its dependent, so a node's predecessors are the plugins it
//! needs and its successors are the plugins that need it.
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::graph::{DirectedGraph, NodeIndex};
use crate::plugin_system::context::PluginContext;
use crate::plugin_system::descriptor::{DependencyDeclaration, PluginDescriptor, PluginId};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::SharedPlugin;

/// Lifecycle state of a plugin node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginState {
    /// At least one hard dependency is not registered yet
    Unresolved,
    /// All hard dependencies are registered; the plugin is not running
    Resolvable,
    /// An instance is running
    Active,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginState::Unresolved => write!(f, "unresolved"),
            PluginState::Resolvable => write!(f, "resolvable"),
            PluginState::Active => write!(f, "active"),
        }
    }
}

/// A registered plugin type and, while active, its instance and context
pub struct PluginNode {
    descriptor: PluginDescriptor,
    missing_dependencies: Vec<DependencyDeclaration>,
    active: bool,
    instance: Option<SharedPlugin>,
    context: Option<Rc<PluginContext>>,
}

impl PluginNode {
    fn new(descriptor: PluginDescriptor) -> Self {
        let missing_dependencies = descriptor.required_dependencies().cloned().collect();
        Self {
            descriptor,
            missing_dependencies,
            active: false,
            instance: None,
            context: None,
        }
    }

    pub fn id(&self) -> &PluginId {
        self.descriptor.id()
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Hard dependencies whose plugin type has not been registered yet
    pub fn missing_dependencies(&self) -> &[DependencyDeclaration] {
        &self.missing_dependencies
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> PluginState {
        if self.active {
            PluginState::Active
        } else if !self.missing_dependencies.is_empty() {
            PluginState::Unresolved
        } else {
            PluginState::Resolvable
        }
    }

    /// The bound instance. Present from construction until disposal.
    pub fn instance(&self) -> Option<&SharedPlugin> {
        self.instance.as_ref()
    }

    /// The bound context. Present from activation until disposal.
    pub fn context(&self) -> Option<&Rc<PluginContext>> {
        self.context.as_ref()
    }

    pub(crate) fn set_instance(&mut self, instance: SharedPlugin) {
        self.instance = Some(instance);
    }

    pub(crate) fn mark_active(&mut self, context: Rc<PluginContext>) {
        self.context = Some(context);
        self.active = true;
    }

    pub(crate) fn mark_inactive(&mut self) {
        self.active = false;
    }

    /// Drop the instance and context
    pub(crate) fn release(&mut self) {
        self.active = false;
        self.instance = None;
        self.context = None;
    }
}

impl fmt::Debug for PluginNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginNode")
            .field("id", self.id())
            .field("state", &self.state())
            .field("missing_dependencies", &self.missing_dependencies)
            .finish_non_exhaustive()
    }
}

/// An active plugin that receives broadcasts
pub(crate) struct Subscriber {
    pub id: PluginId,
    pub instance: SharedPlugin,
    pub context: Rc<PluginContext>,
}

/// Dependency graph over registered plugin types
#[derive(Default)]
pub struct PluginGraph {
    graph: DirectedGraph<PluginNode>,
    index: HashMap<PluginId, NodeIndex>,
}

impl PluginGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin type.
    ///
    /// Fails without touching the graph if the id is already present.
    /// Otherwise the node starts with all of its hard dependencies missing and
    /// resolution runs over the whole graph, since the new node may satisfy
    /// dependencies that earlier nodes are still waiting for.
    pub fn add_node(&mut self, descriptor: PluginDescriptor) -> Result<NodeIndex, PluginSystemError> {
        let id = descriptor.id().clone();
        if self.index.contains_key(&id) {
            return Err(PluginSystemError::DuplicateRegistration {
                plugin_id: id.to_string(),
            });
        }

        let idx = self.graph.add_node(PluginNode::new(descriptor));
        self.index.insert(id, idx);
        self.resolve_missing_dependencies();
        Ok(idx)
    }

    /// Wire every missing dependency whose plugin type is now registered.
    ///
    /// Resolution only depends on which ids are present, so one pass reaches
    /// the fixed point and the final edge set does not depend on the order
    /// in which nodes were added. Returns the number of new edges.
    pub fn resolve_missing_dependencies(&mut self) -> usize {
        let mut wired = 0;
        let indices: Vec<NodeIndex> = self.graph.indices().collect();

        for idx in indices {
            let found: Vec<NodeIndex> = match self.graph.value(idx) {
                Some(node) => node
                    .missing_dependencies
                    .iter()
                    .filter_map(|dep| self.index.get(dep.plugin_id.as_str()).copied())
                    .collect(),
                None => continue,
            };
            if found.is_empty() {
                continue;
            }

            for dependency in found {
                if self.graph.add_successor(dependency, idx) {
                    wired += 1;
                    debug!(
                        "Wired dependency edge {} -> {}",
                        self.id_at(dependency).map(PluginId::as_str).unwrap_or("<unknown>"),
                        self.id_at(idx).map(PluginId::as_str).unwrap_or("<unknown>"),
                    );
                }
            }

            let index = &self.index;
            if let Some(node) = self.graph.value_mut(idx) {
                node.missing_dependencies
                    .retain(|dep| !index.contains_key(dep.plugin_id.as_str()));
            }
        }

        wired
    }

    fn id_at(&self, idx: NodeIndex) -> Option<&PluginId> {
        self.graph.value(idx).map(PluginNode::id)
    }

    fn ids_at(&self, indices: Vec<NodeIndex>) -> Vec<PluginId> {
        indices
            .into_iter()
            .filter_map(|idx| self.id_at(idx).cloned())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&PluginNode> {
        self.index.get(id).and_then(|idx| self.graph.value(*idx))
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut PluginNode> {
        let idx = *self.index.get(id)?;
        self.graph.value_mut(idx)
    }

    /// Plugins `id` depends on (its predecessors), in registration order
    pub fn predecessors(&self, id: &str) -> Vec<PluginId> {
        match self.index.get(id) {
            Some(idx) => self.ids_at(self.graph.predecessors(*idx)),
            None => Vec::new(),
        }
    }

    /// Plugins that depend on `id` (its successors), in wiring order
    pub fn successors(&self, id: &str) -> Vec<PluginId> {
        match self.index.get(id) {
            Some(idx) => self.ids_at(self.graph.successors(*idx)),
            None => Vec::new(),
        }
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<PluginId> {
        self.graph.values().map(|node| node.id().clone()).collect()
    }

    /// Nodes in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &PluginNode> + '_ {
        self.graph.values()
    }

    /// Every edge as `(dependency, dependent)`
    pub fn edges(&self) -> Vec<(PluginId, PluginId)> {
        self.graph
            .edges()
            .into_iter()
            .filter_map(|(from, to, _)| Some((self.id_at(from)?.clone(), self.id_at(to)?.clone())))
            .collect()
    }

    /// Check if the resolved graph contains a dependency cycle
    pub fn has_cycle(&self) -> bool {
        self.graph.has_cycle()
    }

    /// Whether `id` can reach itself through dependency edges
    pub fn is_on_cycle(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|idx| self.graph.reachable_from(*idx).contains(idx))
    }

    /// Active plugins other than `sender`, in registration order
    pub(crate) fn subscribers(&self, sender: &str) -> Vec<Subscriber> {
        self.graph
            .values()
            .filter(|node| node.active && node.id().as_str() != sender)
            .filter_map(|node| {
                Some(Subscriber {
                    id: node.id().clone(),
                    instance: node.instance.clone()?,
                    context: node.context.clone()?,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}
