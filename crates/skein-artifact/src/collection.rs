//! Ordered, key-unique capability set of one node

use crate::capability::Capability;
use crate::error::ArtifactError;
use crate::id::NodeId;
use crate::tree::NodeView;
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Capabilities attached to one node, in attachment order
#[derive(Debug, Default)]
pub struct CapabilityCollection {
    items: IndexMap<String, Box<dyn Capability>>,
}

impl CapabilityCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert capability under its key
    ///
    /// # Errors
    /// Returns `DuplicateCapability` if the key is taken; the existing
    /// capability is left untouched.
    pub(crate) fn insert(
        &mut self,
        node: NodeId,
        capability: Box<dyn Capability>,
    ) -> Result<&mut Box<dyn Capability>, ArtifactError> {
        match self.items.entry(capability.key().to_string()) {
            Entry::Occupied(entry) => Err(ArtifactError::DuplicateCapability {
                node,
                key: entry.key().clone(),
            }),
            Entry::Vacant(entry) => Ok(entry.insert(capability)),
        }
    }

    /// Remove by key, preserving the order of the rest
    pub(crate) fn remove(&mut self, key: &str) -> Option<Box<dyn Capability>> {
        self.items.shift_remove(key)
    }

    /// Get capability by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Capability> {
        self.items.get(key).map(|c| &**c)
    }

    /// Check if key is attached
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// First capability of concrete type `T`
    #[must_use]
    pub fn first_of<T: Capability>(&self) -> Option<&T> {
        self.items.values().find_map(|c| c.as_any().downcast_ref::<T>())
    }

    /// First capability of concrete type `T`, mutably
    pub fn first_of_mut<T: Capability>(&mut self) -> Option<&mut T> {
        self.items
            .values_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Check if any capability of type `T` is attached
    #[inline]
    #[must_use]
    pub fn has<T: Capability>(&self) -> bool {
        self.first_of::<T>().is_some()
    }

    /// Iterate in attachment order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Capability> {
        self.items.values().map(|c| &**c)
    }

    /// Keys in attachment order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Eligible capabilities sorted by phase, then attachment order
    #[must_use]
    pub fn generation_order(&self, node: NodeView<'_>) -> Vec<&dyn Capability> {
        let mut eligible: Vec<&dyn Capability> =
            self.iter().filter(|c| c.can_generate(node)).collect();
        // stable: attachment order within a phase
        eligible.sort_by_key(|c| c.phase());
        eligible
    }

    /// Number of capabilities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
