//! Plugin factories.
//!
//! A factory builds plugin instances and hands out the [`PluginContext`]
//! those instances run with. Contexts are memoised per manager: every plugin
//! a factory serves inside one manager shares the same context object.
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::plugin_system::context::{ManagerId, ManagerRef, PluginContext};
use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::traits::Plugin;

/// Identity of a factory type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryId(Cow<'static, str>);

impl FactoryId {
    /// The factory every plugin without an override is routed to
    pub const DEFAULT: FactoryId = FactoryId::from_static("default");

    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds plugin instances and their contexts
pub trait PluginFactory {
    /// Construct a new instance for `descriptor`. `None` means construction failed.
    fn create_plugin_instance(&self, descriptor: &PluginDescriptor) -> Option<Box<dyn Plugin>>;

    /// Context for `plugin` inside `manager`.
    ///
    /// Implementations must return the same context for repeated calls with
    /// the same manager.
    fn create_plugin_context(&self, manager: &ManagerRef, plugin: &PluginId) -> Rc<PluginContext>;
}

/// Per-manager context memoisation for factories
#[derive(Default)]
pub struct ContextCache {
    contexts: RefCell<HashMap<ManagerId, Rc<PluginContext>>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context cached for `manager`, creating it on first use.
    ///
    /// Entries of managers that no longer exist are dropped on the way.
    pub fn get_or_create(&self, manager: &ManagerRef) -> Rc<PluginContext> {
        let mut contexts = self.contexts.borrow_mut();
        contexts.retain(|_, context| context.is_attached());
        contexts
            .entry(manager.id())
            .or_insert_with(|| Rc::new(manager.new_context()))
            .clone()
    }

    /// Number of cached contexts
    pub fn len(&self) -> usize {
        self.contexts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.borrow().is_empty()
    }
}

/// Factory that runs the descriptor's own constructor
#[derive(Default)]
pub struct DefaultPluginFactory {
    contexts: ContextCache,
}

impl DefaultPluginFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PluginFactory for DefaultPluginFactory {
    fn create_plugin_instance(&self, descriptor: &PluginDescriptor) -> Option<Box<dyn Plugin>> {
        descriptor.construct()
    }

    fn create_plugin_context(&self, manager: &ManagerRef, _plugin: &PluginId) -> Rc<PluginContext> {
        self.contexts.get_or_create(manager)
    }
}

/// Factories known to one manager, in registration order
#[derive(Default)]
pub(crate) struct FactoryRegistry {
    factories: Vec<(FactoryId, Rc<dyn PluginFactory>)>,
}

impl FactoryRegistry {
    /// Registry holding only the default factory
    pub fn with_default() -> Self {
        let mut registry = Self::default();
        registry
            .factories
            .push((FactoryId::DEFAULT, Rc::new(DefaultPluginFactory::new())));
        registry
    }

    pub fn get(&self, id: &FactoryId) -> Option<Rc<dyn PluginFactory>> {
        self.factories
            .iter()
            .find(|(factory_id, _)| factory_id == id)
            .map(|(_, factory)| factory.clone())
    }

    pub fn contains(&self, id: &FactoryId) -> bool {
        self.factories.iter().any(|(factory_id, _)| factory_id == id)
    }

    /// Add a factory. Returns false if the id is taken.
    pub fn insert(&mut self, id: FactoryId, factory: Rc<dyn PluginFactory>) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.factories.push((id, factory));
        true
    }

    pub fn ids(&self) -> Vec<FactoryId> {
        self.factories.iter().map(|(id, _)| id.clone()).collect()
    }
}
