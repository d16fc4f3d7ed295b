use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};

/// An ordered list of plugin descriptors supplied together.
///
/// A catalog only carries descriptors; registering them is up to
/// [`PluginManager::register_catalog`](crate::plugin_system::PluginManager::register_catalog).
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    descriptors: Vec<PluginDescriptor>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn add(&mut self, descriptor: PluginDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Builder-style variant of [`add`](Self::add)
    pub fn with(mut self, descriptor: PluginDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.id().as_str() == id)
    }

    pub fn ids(&self) -> Vec<PluginId> {
        self.descriptors.iter().map(|descriptor| descriptor.id().clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FromIterator<PluginDescriptor> for PluginCatalog {
    fn from_iter<I: IntoIterator<Item = PluginDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PluginCatalog {
    type Item = &'a PluginDescriptor;
    type IntoIter = std::slice::Iter<'a, PluginDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
