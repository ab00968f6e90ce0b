//! Arena-backed artifact tree
//!
//! [`ArtifactTree`] owns every node. Parent links and capability owner links
//! are [`NodeId`] handles into the arena, so the tree is the single owner of
//! the whole graph and no reference cycles exist.
//!
//! # Invariants
//! - A node appears in at most one parent's child list
//! - `child.parent == Some(p)` iff `p.children` contains `child` (once)
//! - The root never has a parent
//! - Capability keys are unique per node

use crate::capability::Capability;
use crate::collection::CapabilityCollection;
use crate::error::ArtifactError;
use crate::id::NodeId;
use crate::node::ArtifactNode;
use crate::property::PropertyStore;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Icon shown for nodes without an icon-contributing capability
pub const DEFAULT_ICON: &str = "node";

/// Tree of artifact nodes with a designated root
///
/// Nodes detached with [`remove_child`](Self::remove_child) stay in the
/// arena, unparented, until they are re-attached or deleted with
/// [`delete_subtree`](Self::delete_subtree).
#[derive(Debug)]
pub struct ArtifactTree {
    nodes: IndexMap<NodeId, ArtifactNode>,
    root: NodeId,
}

impl ArtifactTree {
    /// Create tree with a plain root node
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(ArtifactNode::new())
    }

    /// Create tree around an existing root node
    #[must_use]
    pub fn with_root(root: ArtifactNode) -> Self {
        let id = root.id();
        let mut nodes = IndexMap::new();
        nodes.insert(id, root);
        Self { nodes, root: id }
    }

    /// Root node id
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena (attached or not)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if node id is in the arena
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ArtifactNode> {
        self.nodes.get(&id)
    }

    /// Get node mutably
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ArtifactNode> {
        self.nodes.get_mut(&id)
    }

    /// Read-only view of a node
    #[inline]
    #[must_use]
    pub fn view(&self, id: NodeId) -> Option<NodeView<'_>> {
        self.nodes.get(&id).map(|node| NodeView { tree: self, node })
    }

    /// Iterate over all nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &ArtifactNode> {
        self.nodes.values()
    }

    fn get(&self, id: NodeId) -> Result<&ArtifactNode, ArtifactError> {
        self.nodes.get(&id).ok_or(ArtifactError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut ArtifactNode, ArtifactError> {
        self.nodes.get_mut(&id).ok_or(ArtifactError::NodeNotFound(id))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Create an unparented plain node
    pub fn create_node(&mut self) -> NodeId {
        self.adopt(ArtifactNode::new())
    }

    /// Create an unparented node of a given kind
    pub fn create_node_of_kind(&mut self, kind: impl Into<String>) -> NodeId {
        self.adopt(ArtifactNode::of_kind(kind))
    }

    fn adopt(&mut self, node: ArtifactNode) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Insert an externally built node, unparented
    ///
    /// # Errors
    /// Returns `DuplicateNode` if the id is already present
    pub fn insert_node(&mut self, node: ArtifactNode) -> Result<NodeId, ArtifactError> {
        if self.nodes.contains_key(&node.id()) {
            return Err(ArtifactError::DuplicateNode(node.id()));
        }
        Ok(self.adopt(node))
    }

    /// Append `child` to `parent`'s child list
    ///
    /// # Errors
    /// - `NodeNotFound` if either node is missing
    /// - `RootNode` if `child` is the root
    /// - `CycleDetected` if `child` is `parent` or one of its ancestors
    /// - `AlreadyParented` if `child` already has a parent
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ArtifactError> {
        self.check_attachable(parent, child)?;
        if let Some(existing) = self.get(child)?.parent {
            return Err(ArtifactError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        self.link(parent, child)
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), ArtifactError> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(ArtifactError::RootNode(child));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(ArtifactError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), ArtifactError> {
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        tracing::trace!(%parent, %child, "attached child");
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// Idempotent: returns `false` if `child` was not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(p) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let Some(pos) = p.children.iter().position(|c| *c == child) else {
            return false;
        };
        p.children.remove(pos);
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
        tracing::trace!(%parent, %child, "detached child");
        true
    }

    /// Re-parent `child` under `new_parent`, detaching it first
    ///
    /// # Errors
    /// Same as [`add_child`](Self::add_child) except `AlreadyParented`;
    /// on error the tree is unchanged.
    pub fn move_node(&mut self, child: NodeId, new_parent: NodeId) -> Result<(), ArtifactError> {
        self.check_attachable(new_parent, child)?;
        if let Some(old) = self.get(child)?.parent {
            self.remove_child(old, child);
        }
        self.link(new_parent, child)
    }

    /// Remove a node and all its descendants from the arena
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `RootNode` if `id` is the root
    pub fn delete_subtree(&mut self, id: NodeId) -> Result<usize, ArtifactError> {
        if id == self.root {
            return Err(ArtifactError::RootNode(id));
        }
        if let Some(parent) = self.get(id)?.parent {
            self.remove_child(parent, id);
        }
        let doomed: Vec<NodeId> = self.pre_order(id).map(|v| v.id()).collect();
        for node in &doomed {
            self.nodes.shift_remove(node);
        }
        tracing::debug!(node = %id, removed = doomed.len(), "deleted subtree");
        Ok(doomed.len())
    }

    /// Check if `ancestor` is on `node`'s parent chain
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|v| v.id() == ancestor)
    }

    /// Parent of a node
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of a node (empty if the node is missing)
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    /// Attach a capability to a node
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `InvalidKey` if the capability key is malformed
    /// - `DuplicateCapability` if the key is already attached
    pub fn add_capability<C: Capability>(
        &mut self,
        node: NodeId,
        capability: C,
    ) -> Result<&mut C, ArtifactError> {
        let key = capability.key().to_string();
        let slot = self.attach(node, Box::new(capability))?;
        slot.as_any_mut()
            .downcast_mut::<C>()
            .ok_or(ArtifactError::CapabilityNotFound { node, key })
    }

    /// Attach a type-erased capability (used by reconstruction and plugins)
    ///
    /// # Errors
    /// Same as [`add_capability`](Self::add_capability)
    pub fn add_capability_boxed(
        &mut self,
        node: NodeId,
        capability: Box<dyn Capability>,
    ) -> Result<(), ArtifactError> {
        self.attach(node, capability).map(|_| ())
    }

    fn attach(
        &mut self,
        node: NodeId,
        mut capability: Box<dyn Capability>,
    ) -> Result<&mut Box<dyn Capability>, ArtifactError> {
        PropertyStore::validate_capability_key(capability.key())?;
        let target = self.get_mut(node)?;
        capability.core_mut().attach(node);
        tracing::trace!(%node, key = capability.key(), type_name = capability.type_name(), "attaching capability");
        target.capabilities.insert(node, capability)
    }

    /// Return the node's capability of type `C`, creating it if absent
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `DuplicateCapability` if the new capability's key is taken by a
    ///   capability of another type
    pub fn add_or_get_capability<C, F>(
        &mut self,
        node: NodeId,
        factory: F,
    ) -> Result<&mut C, ArtifactError>
    where
        C: Capability,
        F: FnOnce() -> C,
    {
        if !self.get(node)?.capabilities.has::<C>() {
            return self.add_capability(node, factory());
        }
        self.get_mut(node)?
            .capabilities
            .first_of_mut::<C>()
            .ok_or_else(|| ArtifactError::CapabilityNotFound {
                node,
                key: std::any::type_name::<C>().to_string(),
            })
    }

    /// Detach a capability and purge its property namespace
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `CapabilityNotFound` if no capability has this key
    pub fn remove_capability(
        &mut self,
        node: NodeId,
        key: &str,
    ) -> Result<Box<dyn Capability>, ArtifactError> {
        let target = self.get_mut(node)?;
        let mut capability =
            target
                .capabilities
                .remove(key)
                .ok_or_else(|| ArtifactError::CapabilityNotFound {
                    node,
                    key: key.to_string(),
                })?;
        target.properties.remove_scope(key);
        capability.core_mut().detach();
        tracing::trace!(%node, key, "detached capability");
        Ok(capability)
    }

    /// First capability of type `C` on a node
    #[must_use]
    pub fn capability<C: Capability>(&self, node: NodeId) -> Option<&C> {
        self.nodes.get(&node)?.capabilities.first_of::<C>()
    }

    /// First capability of type `C` on a node, mutably
    pub fn capability_mut<C: Capability>(&mut self, node: NodeId) -> Option<&mut C> {
        self.nodes.get_mut(&node)?.capabilities.first_of_mut::<C>()
    }

    /// Capability by key
    #[must_use]
    pub fn capability_by_key(&self, node: NodeId, key: &str) -> Option<&dyn Capability> {
        self.nodes.get(&node)?.capabilities.get(key)
    }

    /// Capabilities of a node
    #[must_use]
    pub fn capabilities(&self, node: NodeId) -> Option<&CapabilityCollection> {
        self.nodes.get(&node).map(|n| &n.capabilities)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Set a node-level property
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `InvalidKey` if the name is empty
    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ArtifactError> {
        PropertyStore::validate_name(name)?;
        Ok(self.get_mut(node)?.properties.set(name, value))
    }

    /// Get a node-level property
    #[must_use]
    pub fn property(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.nodes.get(&node)?.properties.get(name)
    }

    /// Set a property in a capability's namespace
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `CapabilityNotFound` if the key is not attached to the node
    /// - `InvalidKey` if the name is empty
    pub fn set_capability_property(
        &mut self,
        node: NodeId,
        key: &str,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ArtifactError> {
        let target = self.get_mut(node)?;
        let scoped = target
            .capabilities
            .get(key)
            .ok_or_else(|| ArtifactError::CapabilityNotFound {
                node,
                key: key.to_string(),
            })?
            .core()
            .scoped_key(name)?;
        Ok(target.properties.set(scoped, value))
    }

    /// Get a property from a capability's namespace
    ///
    /// # Errors
    /// - `NodeNotFound` if the node is missing
    /// - `CapabilityNotFound` if the key is not attached to the node
    pub fn capability_property(
        &self,
        node: NodeId,
        key: &str,
        name: &str,
    ) -> Result<Option<&Value>, ArtifactError> {
        let target = self.get(node)?;
        let scoped = target
            .capabilities
            .get(key)
            .ok_or_else(|| ArtifactError::CapabilityNotFound {
                node,
                key: key.to_string(),
            })?
            .core()
            .scoped_key(name)?;
        Ok(target.properties.get(&scoped))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Nearest ancestor (excluding `node`) carrying capability `C`
    #[must_use]
    pub fn find_ancestor<C: Capability>(&self, node: NodeId) -> Option<(NodeId, &C)> {
        self.ancestors(node)
            .find_map(|v| v.capability::<C>().map(|c| (v.id(), c)))
    }

    /// Lazy pre-order sequence of descendants (excluding `node`) carrying `C`
    ///
    /// Recomputed on every call; nothing is cached.
    #[must_use]
    pub fn find_descendants<C: Capability>(&self, node: NodeId) -> Descendants<'_, C> {
        let mut stack: Vec<NodeId> = self.children(node).to_vec();
        stack.reverse();
        Descendants {
            tree: self,
            stack,
            _marker: PhantomData,
        }
    }

    /// Pre-order walk of a subtree, starting with `node`
    #[must_use]
    pub fn pre_order(&self, node: NodeId) -> PreOrder<'_> {
        let stack = if self.contains(node) { vec![node] } else { Vec::new() };
        PreOrder { tree: self, stack }
    }

    /// Parent chain of a node, nearest first (excluding `node`)
    #[must_use]
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    /// Display text derived from capabilities
    ///
    /// First capability contribution in attachment order, then the `Name`
    /// property, then the node kind.
    #[must_use]
    pub fn display_text(&self, node: NodeId) -> Option<String> {
        self.view(node).map(|v| v.display_text())
    }

    /// Display icon derived from capabilities
    #[must_use]
    pub fn display_icon(&self, node: NodeId) -> Option<&'static str> {
        self.view(node).map(|v| v.display_icon())
    }
}

impl Default for ArtifactTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to one node and its tree
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a ArtifactTree,
    node: &'a ArtifactNode,
}

impl<'a> NodeView<'a> {
    /// Node id
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Node discriminator
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'a str {
        self.node.kind()
    }

    /// Underlying node
    #[inline]
    #[must_use]
    pub fn node(&self) -> &'a ArtifactNode {
        self.node
    }

    /// Owning tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &'a ArtifactTree {
        self.tree
    }

    /// Parent view
    #[must_use]
    pub fn parent(&self) -> Option<NodeView<'a>> {
        self.node.parent.and_then(|p| self.tree.view(p))
    }

    /// Child views in order
    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let tree = self.tree;
        self.node.children.iter().filter_map(move |c| tree.view(*c))
    }

    /// Property store
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &'a PropertyStore {
        &self.node.properties
    }

    /// Node-level property
    #[inline]
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&'a Value> {
        self.node.properties.get(name)
    }

    /// Capabilities
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &'a CapabilityCollection {
        &self.node.capabilities
    }

    /// First capability of type `C`
    #[inline]
    #[must_use]
    pub fn capability<C: Capability>(&self) -> Option<&'a C> {
        self.node.capabilities.first_of::<C>()
    }

    /// Check if a capability of type `C` is attached
    #[inline]
    #[must_use]
    pub fn has<C: Capability>(&self) -> bool {
        self.node.capabilities.has::<C>()
    }

    /// Nearest ancestor carrying `C`
    #[must_use]
    pub fn find_ancestor<C: Capability>(&self) -> Option<(NodeView<'a>, &'a C)> {
        self.tree
            .ancestors(self.id())
            .find_map(|v| v.capability::<C>().map(|c| (v, c)))
    }

    /// Display text: first capability contribution, `Name`, or kind
    #[must_use]
    pub fn display_text(&self) -> String {
        self.node
            .capabilities
            .iter()
            .find_map(|c| c.display_text(*self))
            .or_else(|| self.node.properties.get_str("Name").map(str::to_string))
            .unwrap_or_else(|| self.node.kind().to_string())
    }

    /// Display icon: first capability contribution or [`DEFAULT_ICON`]
    #[must_use]
    pub fn display_icon(&self) -> &'static str {
        self.node
            .capabilities
            .iter()
            .find_map(|c| c.display_icon())
            .unwrap_or(DEFAULT_ICON)
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.node.id())
            .field("kind", &self.node.kind())
            .finish()
    }
}

/// Pre-order subtree iterator
#[derive(Debug)]
pub struct PreOrder<'a> {
    tree: &'a ArtifactTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(view) = self.tree.view(id) {
                self.stack.extend(view.node.children.iter().rev());
                return Some(view);
            }
        }
        None
    }
}

/// Lazy pre-order iterator over descendants carrying capability `C`
pub struct Descendants<'a, C> {
    tree: &'a ArtifactTree,
    stack: Vec<NodeId>,
    _marker: PhantomData<fn() -> C>,
}

impl<'a, C: Capability> Iterator for Descendants<'a, C> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Some(view) = self.tree.view(id) else {
                continue;
            };
            self.stack.extend(view.node.children.iter().rev());
            if view.has::<C>() {
                return Some(view);
            }
        }
        None
    }
}

impl<C> fmt::Debug for Descendants<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descendants")
            .field("pending", &self.stack.len())
            .finish()
    }
}

/// Parent-chain iterator, nearest first
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a ArtifactTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.tree.view(self.next?)?;
        self.next = view.node.parent;
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, Tag};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn chain(tree: &mut ArtifactTree) -> (NodeId, NodeId, NodeId) {
        let a = tree.create_node();
        let b = tree.create_node();
        let c = tree.create_node();
        tree.add_child(tree.root(), a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();
        (a, b, c)
    }

    #[test]
    fn add_child_sets_parent_once() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let x = tree.create_node();
        tree.add_child(root, x).unwrap();

        assert_eq!(tree.parent(x), Some(root));
        assert_eq!(tree.children(root).iter().filter(|c| **c == x).count(), 1);
    }

    #[test]
    fn add_child_twice_is_rejected() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let x = tree.create_node();
        tree.add_child(root, x).unwrap();

        let err = tree.add_child(root, x).unwrap_err();
        assert!(matches!(err, ArtifactError::AlreadyParented { .. }));
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn add_child_under_second_parent_is_rejected() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let p1 = tree.create_node();
        let p2 = tree.create_node();
        let x = tree.create_node();
        tree.add_child(root, p1).unwrap();
        tree.add_child(root, p2).unwrap();
        tree.add_child(p1, x).unwrap();

        assert!(matches!(
            tree.add_child(p2, x),
            Err(ArtifactError::AlreadyParented { parent, .. }) if parent == p1
        ));
        assert!(tree.children(p2).is_empty());
    }

    #[test]
    fn add_child_rejects_cycles() {
        let mut tree = ArtifactTree::new();
        let (a, _b, c) = chain(&mut tree);
        let loose = tree.create_node();

        assert!(matches!(
            tree.add_child(loose, loose),
            Err(ArtifactError::CycleDetected { .. })
        ));
        assert!(tree.remove_child(tree.root(), a));
        assert!(matches!(
            tree.add_child(c, a),
            Err(ArtifactError::CycleDetected { .. })
        ));
    }

    #[test]
    fn root_cannot_become_child() {
        let mut tree = ArtifactTree::new();
        let x = tree.create_node();
        let root = tree.root();
        assert!(matches!(tree.add_child(x, root), Err(ArtifactError::RootNode(_))));
    }

    #[test]
    fn remove_child_clears_parent_and_is_idempotent() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let x = tree.create_node();
        tree.add_child(root, x).unwrap();

        assert!(tree.remove_child(root, x));
        assert_eq!(tree.parent(x), None);
        assert!(!tree.children(root).contains(&x));
        assert!(!tree.remove_child(root, x));
        assert!(tree.contains(x));
    }

    #[test]
    fn move_node_reparents() {
        let mut tree = ArtifactTree::new();
        let (a, b, c) = chain(&mut tree);
        tree.move_node(c, a).unwrap();

        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.children(a), &[b, c]);
        assert!(tree.children(b).is_empty());
    }

    #[test]
    fn move_node_into_own_subtree_leaves_tree_unchanged() {
        let mut tree = ArtifactTree::new();
        let (a, b, c) = chain(&mut tree);
        assert!(tree.move_node(a, c).is_err());
        assert_eq!(tree.parent(a), Some(tree.root()));
        assert_eq!(tree.children(b), &[c]);
    }

    #[test]
    fn delete_subtree_removes_descendants() {
        let mut tree = ArtifactTree::new();
        let (a, b, c) = chain(&mut tree);
        assert_eq!(tree.delete_subtree(b).unwrap(), 2);
        assert!(!tree.contains(b));
        assert!(!tree.contains(c));
        assert!(tree.children(a).is_empty());
        assert!(tree.delete_subtree(tree.root()).is_err());
    }

    #[test]
    fn duplicate_capability_key_rejected() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, Tag::new("FileProperties")).unwrap();
        let err = tree
            .add_capability(root, Tag::new("FileProperties"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::DuplicateCapability { ref key, .. } if key == "FileProperties"));
        assert_eq!(tree.capabilities(root).unwrap().len(), 1);
    }

    #[test]
    fn add_capability_binds_owner() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let tag = tree.add_capability(root, Tag::new("A")).unwrap();
        assert_eq!(tag.core().owner(), Some(root));
    }

    #[test]
    fn invalid_capability_key_rejected() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        assert!(matches!(
            tree.add_capability(root, Tag::new("a.b")),
            Err(ArtifactError::InvalidKey(_))
        ));
    }

    #[test]
    fn add_or_get_is_idempotent() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_or_get_capability(root, || Tag::new("A")).unwrap();
        tree.add_or_get_capability(root, || Tag::new("B")).unwrap();

        let keys: Vec<_> = tree.capabilities(root).unwrap().keys().collect();
        assert_eq!(keys, vec!["A"]);
    }

    #[test]
    fn remove_capability_detaches_and_purges() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, Tag::new("A")).unwrap();
        tree.set_capability_property(root, "A", "Value", 1).unwrap();
        tree.set_property(root, "Name", "root").unwrap();

        let removed = tree.remove_capability(root, "A").unwrap();
        assert!(!removed.core().is_attached());
        assert!(removed.core().scoped_key("Value").is_err());
        assert!(tree.node(root).unwrap().properties().get("A.Value").is_none());
        assert_eq!(tree.property(root, "Name"), Some(&json!("root")));
    }

    #[test]
    fn capability_properties_are_isolated() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, Tag::new("A")).unwrap();
        tree.add_capability(root, Tag::new("B")).unwrap();
        tree.set_capability_property(root, "A", "Value", "a").unwrap();
        tree.set_capability_property(root, "B", "Value", "b").unwrap();

        let a = tree.capability_property(root, "A", "Value").unwrap();
        let b = tree.capability_property(root, "B", "Value").unwrap();
        assert_eq!(a, Some(&json!("a")));
        assert_eq!(b, Some(&json!("b")));
        assert_ne!(a, b);
    }

    #[test]
    fn capability_property_requires_attached_key() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        assert!(matches!(
            tree.set_capability_property(root, "Missing", "Value", 1),
            Err(ArtifactError::CapabilityNotFound { .. })
        ));
    }

    #[test]
    fn core_property_rejects_foreign_node() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let other = tree.create_node();
        tree.add_capability(root, Tag::new("A")).unwrap();

        let tag = tree.capability::<Tag>(root).unwrap();
        let err = tag.core().property(tree.view(other).unwrap(), "Value").unwrap_err();
        assert!(matches!(err, ArtifactError::ForeignNode { .. }));
    }

    #[test]
    fn find_ancestor_returns_nearest() {
        let mut tree = ArtifactTree::new();
        let (a, b, c) = chain(&mut tree);
        tree.add_capability(a, Tag::new("T")).unwrap();
        tree.add_capability(b, Tag::new("T")).unwrap();

        let (found, _) = tree.find_ancestor::<Tag>(c).unwrap();
        assert_eq!(found, b);
        assert!(tree.find_ancestor::<Tag>(a).is_none());
        assert!(tree.find_ancestor::<Probe>(c).is_none());
    }

    #[test]
    fn find_descendants_is_pre_order_and_restartable() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        let a = tree.create_node();
        let a1 = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, a1).unwrap();
        tree.add_child(root, b).unwrap();
        for id in [a, a1, b] {
            tree.add_capability(id, Tag::new("T")).unwrap();
        }

        let first: Vec<_> = tree.find_descendants::<Tag>(root).map(|v| v.id()).collect();
        assert_eq!(first, vec![a, a1, b]);

        tree.remove_capability(a1, "T").unwrap();
        let second: Vec<_> = tree.find_descendants::<Tag>(root).map(|v| v.id()).collect();
        assert_eq!(second, vec![a, b]);
    }

    #[test]
    fn pre_order_includes_start() {
        let mut tree = ArtifactTree::new();
        let (a, b, c) = chain(&mut tree);
        let ids: Vec<_> = tree.pre_order(tree.root()).map(|v| v.id()).collect();
        assert_eq!(ids, vec![tree.root(), a, b, c]);
    }

    #[test]
    fn display_text_prefers_capabilities() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        assert_eq!(tree.display_text(root).unwrap(), "Artifact");
        assert_eq!(tree.display_icon(root).unwrap(), DEFAULT_ICON);

        tree.set_property(root, "Name", "workspace").unwrap();
        assert_eq!(tree.display_text(root).unwrap(), "workspace");

        tree.add_capability(root, Tag::new("Label").with_display("labelled"))
            .unwrap();
        assert_eq!(tree.display_text(root).unwrap(), "labelled");
        assert_eq!(tree.display_icon(root).unwrap(), "tag");
    }

    #[test]
    fn generation_order_sorts_by_phase_then_attachment() {
        use crate::capability::GenerationPhase;

        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, Probe::new("emit1")).unwrap();
        tree.add_capability(root, Probe::new("prep").with_phase(GenerationPhase::Prepare))
            .unwrap();
        tree.add_capability(root, Probe::new("off").eligible(false)).unwrap();
        tree.add_capability(root, Probe::new("emit2")).unwrap();

        let view = tree.view(root).unwrap();
        let order: Vec<_> = view
            .capabilities()
            .generation_order(view)
            .iter()
            .map(|c| c.key().to_string())
            .collect();
        assert_eq!(order, vec!["prep", "emit1", "emit2"]);
    }
}
