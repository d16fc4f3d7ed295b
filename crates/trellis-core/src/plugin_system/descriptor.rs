//! Static plugin metadata supplied at registration time.
//!
//! A [`PluginDescriptor`] replaces attribute-style metadata: it names the
//! plugin, lists its [`DependencyDeclaration`]s, optionally routes it to a
//! non-default factory and carries the constructor the default factory uses.
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::factory::{FactoryId, PluginFactory};
use crate::plugin_system::traits::Plugin;

/// Stable identity of a plugin type. Used as graph key and map key everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(Cow<'static, str>);

impl PluginId {
    /// Create an id from a static string, usable in constants
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Create an id from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for PluginId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Represents a dependency on another plugin type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyDeclaration {
    /// The plugin type that is required
    pub plugin_id: PluginId,

    /// Optional dependencies never block activation and create no graph edge
    pub optional: bool,
}

impl DependencyDeclaration {
    /// Create a hard requirement
    pub fn required(plugin_id: impl Into<PluginId>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            optional: false,
        }
    }

    /// Create an optional dependency
    pub fn optional(plugin_id: impl Into<PluginId>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            optional: true,
        }
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement_type = if self.optional { "Optional" } else { "Requires" };
        write!(f, "{} plugin: {}", requirement_type, self.plugin_id)
    }
}

/// Routes a plugin to a specific factory.
///
/// `provider` is only invoked when the manager has no factory registered
/// under `id` and accepts unregistered factories.
#[derive(Clone)]
pub struct FactoryRef {
    id: FactoryId,
    provider: fn() -> Rc<dyn PluginFactory>,
}

impl FactoryRef {
    pub const fn new(id: FactoryId, provider: fn() -> Rc<dyn PluginFactory>) -> Self {
        Self { id, provider }
    }

    pub fn id(&self) -> &FactoryId {
        &self.id
    }

    /// Build a fresh factory instance
    pub fn instantiate(&self) -> Rc<dyn PluginFactory> {
        (self.provider)()
    }
}

impl fmt::Debug for FactoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRef").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Constructor used by the default factory. `None` means construction failed.
pub type PluginConstructor = Rc<dyn Fn() -> Option<Box<dyn Plugin>>>;

/// Describes a plugin type: identity, name, dependencies and construction
#[derive(Clone)]
pub struct PluginDescriptor {
    id: PluginId,
    name: Option<String>,
    version: Option<Version>,
    description: Option<String>,
    dependencies: Vec<DependencyDeclaration>,
    factory: Option<FactoryRef>,
    constructor: Option<PluginConstructor>,
}

impl PluginDescriptor {
    /// Start building a descriptor for `id`
    pub fn builder(id: impl Into<PluginId>) -> DescriptorBuilder {
        DescriptorBuilder::new(id)
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Human-readable name.
    ///
    /// Every plugin must declare one; its absence is reported here rather
    /// than at registration.
    pub fn name(&self) -> Result<&str, PluginSystemError> {
        self.name
            .as_deref()
            .ok_or_else(|| PluginSystemError::MissingMetadata {
                plugin_id: self.id.to_string(),
                field: "name",
            })
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All declared dependencies, optional ones included
    pub fn dependencies(&self) -> &[DependencyDeclaration] {
        &self.dependencies
    }

    /// Declared hard requirements only
    pub fn required_dependencies(&self) -> impl Iterator<Item = &DependencyDeclaration> + '_ {
        self.dependencies.iter().filter(|dep| !dep.optional)
    }

    /// Whether this plugin declares any dependency on `other`
    pub fn requires(&self, other: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.plugin_id.as_str() == other)
    }

    /// Factory override, if any. `None` routes to the default factory.
    pub fn factory(&self) -> Option<&FactoryRef> {
        self.factory.as_ref()
    }

    /// Id of the factory responsible for this plugin
    pub fn factory_id(&self) -> FactoryId {
        self.factory
            .as_ref()
            .map(|f| f.id().clone())
            .unwrap_or(FactoryId::DEFAULT)
    }

    /// Run the declared constructor. `None` if none is declared or it failed.
    pub fn construct(&self) -> Option<Box<dyn Plugin>> {
        self.constructor.as_ref().and_then(|ctor| ctor())
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .field("factory", &self.factory)
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Builder for creating a plugin descriptor
pub struct DescriptorBuilder {
    descriptor: PluginDescriptor,
}

impl DescriptorBuilder {
    /// Create a new descriptor builder
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            descriptor: PluginDescriptor {
                id: id.into(),
                name: None,
                version: None,
                description: None,
                dependencies: Vec::new(),
                factory: None,
                constructor: None,
            },
        }
    }

    /// Set the human-readable name
    pub fn name(mut self, name: &str) -> Self {
        self.descriptor.name = Some(name.to_string());
        self
    }

    /// Set the plugin version
    pub fn version(mut self, version: Version) -> Self {
        self.descriptor.version = Some(version);
        self
    }

    /// Set the plugin description
    pub fn description(mut self, description: &str) -> Self {
        self.descriptor.description = Some(description.to_string());
        self
    }

    /// Add a hard requirement
    pub fn requires(mut self, plugin_id: impl Into<PluginId>) -> Self {
        self.descriptor.dependencies.push(DependencyDeclaration::required(plugin_id));
        self
    }

    /// Add an optional dependency
    pub fn optionally_requires(mut self, plugin_id: impl Into<PluginId>) -> Self {
        self.descriptor.dependencies.push(DependencyDeclaration::optional(plugin_id));
        self
    }

    /// Add an already-built declaration
    pub fn dependency(mut self, dependency: DependencyDeclaration) -> Self {
        self.descriptor.dependencies.push(dependency);
        self
    }

    /// Route construction to a specific factory
    pub fn factory(mut self, factory: FactoryRef) -> Self {
        self.descriptor.factory = Some(factory);
        self
    }

    /// Construct instances with `P::default()`
    pub fn default_constructible<P>(self) -> Self
    where
        P: Plugin + Default + 'static,
    {
        self.constructor(P::default)
    }

    /// Construct instances with an infallible closure
    pub fn constructor<F, P>(mut self, ctor: F) -> Self
    where
        F: Fn() -> P + 'static,
        P: Plugin + 'static,
    {
        self.descriptor.constructor = Some(Rc::new(move || Some(Box::new(ctor()) as Box<dyn Plugin>)));
        self
    }

    /// Construct instances with a closure that may yield no instance
    pub fn fallible_constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> Option<Box<dyn Plugin>> + 'static,
    {
        self.descriptor.constructor = Some(Rc::new(ctor));
        self
    }

    /// Build the descriptor
    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}
