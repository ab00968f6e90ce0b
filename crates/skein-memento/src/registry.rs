//! Type-keyed factories for reconstruction
//!
//! Provides [`FactoryRegistry`], mapping persisted discriminators to
//! constructors for nodes and capabilities. Registration is expected at
//! startup; lookups are concurrent and lock only long enough to clone the
//! constructor handle.

use crate::error::MementoError;
use crate::state::{DecoratorState, NodeState};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use skein_artifact::{ArtifactNode, Capability, NodeId, DEFAULT_NODE_KIND};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a bare node (id and kind only) from its record
pub type NodeConstructor = Arc<dyn Fn(&NodeState) -> Result<ArtifactNode, MementoError> + Send + Sync>;

/// Builds an unattached capability from its record
pub type CapabilityConstructor =
    Arc<dyn Fn(&DecoratorState) -> Result<Box<dyn Capability>, MementoError> + Send + Sync>;

/// Capability that knows its own discriminator and how to rebuild itself
///
/// Only the capability object is rebuilt here; scoped properties are
/// restored into the node's store after attachment.
pub trait Restorable: Capability + Sized {
    /// Discriminator written to [`DecoratorState::type_name`]
    const TYPE_NAME: &'static str;

    /// Rebuild an unattached capability from its record
    ///
    /// # Errors
    /// Implementation-defined validation failures
    fn restore(state: &DecoratorState) -> Result<Self, MementoError>;
}

static GLOBAL: Lazy<FactoryRegistry> = Lazy::new(FactoryRegistry::new);

/// Discriminator → constructor tables
pub struct FactoryRegistry {
    nodes: RwLock<HashMap<String, NodeConstructor>>,
    capabilities: RwLock<HashMap<String, CapabilityConstructor>>,
}

impl FactoryRegistry {
    /// Create registry knowing only the default node kind
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            nodes: RwLock::new(HashMap::new()),
            capabilities: RwLock::new(HashMap::new()),
        };
        registry.register_node_kind(DEFAULT_NODE_KIND);
        registry
    }

    /// Process-wide registry
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Register a node constructor
    ///
    /// Returns `true` if an earlier constructor was replaced.
    pub fn register_node<F>(&self, type_name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(&NodeState) -> Result<ArtifactNode, MementoError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        tracing::debug!(%type_name, "registering node type");
        let replaced = self
            .nodes
            .write()
            .insert(type_name.clone(), Arc::new(constructor))
            .is_some();
        if replaced {
            tracing::warn!(%type_name, "node constructor replaced");
        }
        replaced
    }

    /// Register a plain node kind: id and kind taken from the record
    pub fn register_node_kind(&self, type_name: &str) -> bool {
        self.register_node(type_name, |state| {
            Ok(ArtifactNode::with_id(state.id, state.type_name.clone()))
        })
    }

    /// Register a capability constructor
    ///
    /// Returns `true` if an earlier constructor was replaced.
    pub fn register_capability<F>(&self, type_name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(&DecoratorState) -> Result<Box<dyn Capability>, MementoError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        tracing::debug!(%type_name, "registering capability type");
        let replaced = self
            .capabilities
            .write()
            .insert(type_name.clone(), Arc::new(constructor))
            .is_some();
        if replaced {
            tracing::warn!(%type_name, "capability constructor replaced");
        }
        replaced
    }

    /// Register a [`Restorable`] capability under its own discriminator
    pub fn register_restorable<T: Restorable>(&self) -> bool {
        self.register_capability(T::TYPE_NAME, |state| {
            T::restore(state).map(|c| Box::new(c) as Box<dyn Capability>)
        })
    }

    /// Remove a node constructor
    pub fn unregister_node(&self, type_name: &str) -> bool {
        self.nodes.write().remove(type_name).is_some()
    }

    /// Remove a capability constructor
    pub fn unregister_capability(&self, type_name: &str) -> bool {
        self.capabilities.write().remove(type_name).is_some()
    }

    /// Check if a node discriminator is known
    #[inline]
    #[must_use]
    pub fn contains_node(&self, type_name: &str) -> bool {
        self.nodes.read().contains_key(type_name)
    }

    /// Check if a capability discriminator is known
    #[inline]
    #[must_use]
    pub fn contains_capability(&self, type_name: &str) -> bool {
        self.capabilities.read().contains_key(type_name)
    }

    /// Known node discriminators, sorted
    #[must_use]
    pub fn node_types(&self) -> Vec<String> {
        sorted_keys(&self.nodes.read())
    }

    /// Known capability discriminators, sorted
    #[must_use]
    pub fn capability_types(&self) -> Vec<String> {
        sorted_keys(&self.capabilities.read())
    }

    /// Build a node from its record
    ///
    /// # Errors
    /// - `UnknownNodeType` if the discriminator is not registered
    /// - `MalformedState` if the constructor ignores the record's id or kind
    pub fn construct_node(&self, state: &NodeState) -> Result<ArtifactNode, MementoError> {
        let constructor = self
            .nodes
            .read()
            .get(&state.type_name)
            .cloned()
            .ok_or_else(|| MementoError::UnknownNodeType {
                type_name: state.type_name.clone(),
                node: state.id,
            })?;
        let node = constructor(state)?;
        if node.id() != state.id || node.kind() != state.type_name {
            return Err(MementoError::malformed(format!(
                "constructor for '{}' produced node {} of kind '{}'",
                state.type_name,
                node.id(),
                node.kind()
            )));
        }
        Ok(node)
    }

    /// Build an unattached capability from its record, for `node`
    ///
    /// # Errors
    /// - `UnknownCapabilityType` if the discriminator is not registered
    /// - `MalformedState` if the constructor ignores the record's key
    pub fn construct_capability(
        &self,
        node: NodeId,
        state: &DecoratorState,
    ) -> Result<Box<dyn Capability>, MementoError> {
        let constructor = self
            .capabilities
            .read()
            .get(&state.type_name)
            .cloned()
            .ok_or_else(|| MementoError::UnknownCapabilityType {
                type_name: state.type_name.clone(),
                node,
                key: state.key.clone(),
            })?;
        let capability = constructor(state)?;
        if capability.key() != state.key {
            return Err(MementoError::malformed(format!(
                "constructor for '{}' produced key '{}', expected '{}'",
                state.type_name,
                capability.key(),
                state.key
            )));
        }
        Ok(capability)
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("nodes", &self.node_types())
            .field("capabilities", &self.capability_types())
            .finish()
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
