//! Artifact node
//!
//! A node is identity + position in the tree + capabilities + properties.
//! Structural fields (`parent`, `children`) are only mutated through
//! [`ArtifactTree`](crate::ArtifactTree), which enforces the ownership
//! invariants.

use crate::collection::CapabilityCollection;
use crate::id::NodeId;
use crate::property::PropertyStore;

/// Discriminator of plain nodes
pub const DEFAULT_NODE_KIND: &str = "Artifact";

/// Tree node owning an ordered child list and a capability collection
#[derive(Debug)]
pub struct ArtifactNode {
    id: NodeId,
    kind: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) capabilities: CapabilityCollection,
    pub(crate) properties: PropertyStore,
}

impl ArtifactNode {
    /// Create plain node with a fresh id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(NodeId::new(), DEFAULT_NODE_KIND)
    }

    /// Create node of a specific kind with a fresh id
    #[inline]
    #[must_use]
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self::with_id(NodeId::new(), kind)
    }

    /// Create node with a known id (restoring persisted state)
    #[must_use]
    pub fn with_id(id: NodeId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            parent: None,
            children: Vec::new(),
            capabilities: CapabilityCollection::new(),
            properties: PropertyStore::new(),
        }
    }

    /// Stable identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Persisted node discriminator
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Parent handle
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered child handles
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attached capabilities
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityCollection {
        &self.capabilities
    }

    /// Property store (node-level and capability-scoped entries)
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Mutable property store
    ///
    /// Writing capability-scoped keys directly bypasses attachment checks;
    /// prefer [`ArtifactTree::set_capability_property`](crate::ArtifactTree::set_capability_property).
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }
}

impl Default for ArtifactNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_plain_and_detached() {
        let node = ArtifactNode::new();
        assert_eq!(node.kind(), DEFAULT_NODE_KIND);
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert!(node.capabilities().is_empty());
        assert!(node.properties().is_empty());
    }

    #[test]
    fn with_id_keeps_identity() {
        let id = NodeId::new();
        let node = ArtifactNode::with_id(id, "File");
        assert_eq!(node.id(), id);
        assert_eq!(node.kind(), "File");
    }
}
