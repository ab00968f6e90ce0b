//! Typed façade over a node + one of its capabilities
//!
//! A [`Host`] narrows the generic tree API to "this node, as a `C`":
//! property reads and writes go to `C`'s namespace without repeating the
//! capability key. Specialised hosts (a file, a folder) wrap it.

use crate::capability::Capability;
use crate::error::ArtifactError;
use crate::id::NodeId;
use crate::tree::ArtifactTree;
use serde_json::Value;
use std::marker::PhantomData;

/// Mutable typed view of one node through capability `C`
#[derive(Debug)]
pub struct Host<'t, C> {
    tree: &'t mut ArtifactTree,
    node: NodeId,
    key: String,
    _marker: PhantomData<fn() -> C>,
}

impl<'t, C: Capability> Host<'t, C> {
    /// Wrap an existing node, attaching `C` if it is not there yet
    ///
    /// # Errors
    /// Same as [`ArtifactTree::add_or_get_capability`]
    pub fn attach<F>(tree: &'t mut ArtifactTree, node: NodeId, factory: F) -> Result<Self, ArtifactError>
    where
        F: FnOnce() -> C,
    {
        let key = tree.add_or_get_capability(node, factory)?.key().to_string();
        Ok(Self {
            tree,
            node,
            key,
            _marker: PhantomData,
        })
    }

    /// Create a node of `kind` under `parent` and attach `C`
    ///
    /// # Errors
    /// Same as [`ArtifactTree::add_child`] and
    /// [`ArtifactTree::add_capability`]; on error the new node is removed.
    pub fn create<F>(
        tree: &'t mut ArtifactTree,
        parent: NodeId,
        kind: &str,
        factory: F,
    ) -> Result<Self, ArtifactError>
    where
        F: FnOnce() -> C,
    {
        let node = tree.create_node_of_kind(kind);
        let attached = tree
            .add_child(parent, node)
            .and_then(|()| tree.add_capability(node, factory()).map(|c| c.key().to_string()));
        match attached {
            Ok(key) => Ok(Self {
                tree,
                node,
                key,
                _marker: PhantomData,
            }),
            Err(e) => {
                // node was never visible to the caller
                let _ = tree.delete_subtree(node);
                Err(e)
            }
        }
    }

    /// Node id
    #[inline]
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Capability key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The wrapped capability
    ///
    /// # Errors
    /// Returns `CapabilityNotFound` if it was removed behind the host's back
    pub fn capability(&self) -> Result<&C, ArtifactError> {
        self.tree
            .capability::<C>(self.node)
            .ok_or_else(|| self.missing())
    }

    /// Read a property in the capability's namespace
    ///
    /// # Errors
    /// Same as [`ArtifactTree::capability_property`]
    pub fn get(&self, name: &str) -> Result<Option<&Value>, ArtifactError> {
        self.tree.capability_property(self.node, &self.key, name)
    }

    /// Read a string property in the capability's namespace
    ///
    /// # Errors
    /// Same as [`get`](Self::get)
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, ArtifactError> {
        Ok(self.get(name)?.and_then(Value::as_str))
    }

    /// Write a property in the capability's namespace
    ///
    /// # Errors
    /// Same as [`ArtifactTree::set_capability_property`]
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self, ArtifactError> {
        self.tree
            .set_capability_property(self.node, &self.key, name, value)?;
        Ok(self)
    }

    /// Write a node-level property
    ///
    /// # Errors
    /// Same as [`ArtifactTree::set_property`]
    pub fn set_node_property(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ArtifactError> {
        self.tree.set_property(self.node, name, value)?;
        Ok(self)
    }

    /// Underlying tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ArtifactTree {
        self.tree
    }

    /// Underlying tree, mutably
    #[inline]
    pub fn tree_mut(&mut self) -> &mut ArtifactTree {
        self.tree
    }

    fn missing(&self) -> ArtifactError {
        ArtifactError::CapabilityNotFound {
            node: self.node,
            key: self.key.clone(),
        }
    }
}
