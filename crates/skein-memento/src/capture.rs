//! Tree → snapshot
//!
//! Capture walks a (sub)tree in pre-order and emits one [`NodeState`] per
//! node. Properties are split by namespace: entries under an attached
//! capability's key go to that capability's [`DecoratorState`], the rest
//! stay node-level.

use crate::error::MementoError;
use crate::state::{DecoratorState, NodeState, PropertyBag, WorkspaceState};
use skein_artifact::{ArtifactError, ArtifactTree, NodeId, NodeView, PropertyStore, SCOPE_SEPARATOR};

/// Snapshot the subtree rooted at `root`
///
/// The captured root has no parent in the snapshot even when it has one in
/// the live tree.
///
/// # Errors
/// Returns `Artifact(NodeNotFound)` if `root` is not in the tree
pub fn capture(tree: &ArtifactTree, root: NodeId) -> Result<WorkspaceState, MementoError> {
    if !tree.contains(root) {
        return Err(ArtifactError::NodeNotFound(root).into());
    }
    let nodes: Vec<NodeState> = tree
        .pre_order(root)
        .map(|view| {
            let parent = if view.id() == root {
                None
            } else {
                view.parent().map(|p| p.id())
            };
            capture_node(view, parent)
        })
        .collect();
    tracing::debug!(%root, nodes = nodes.len(), "captured subtree");
    Ok(WorkspaceState::new(root, nodes))
}

/// Snapshot the whole tree
///
/// # Errors
/// Same as [`capture`]
pub fn capture_tree(tree: &ArtifactTree) -> Result<WorkspaceState, MementoError> {
    capture(tree, tree.root())
}

fn capture_node(view: NodeView<'_>, parent: Option<NodeId>) -> NodeState {
    let store = view.properties();
    let capabilities = view.capabilities();

    let decorators = capabilities
        .iter()
        .map(|cap| DecoratorState {
            type_name: cap.type_name().to_string(),
            key: cap.key().to_string(),
            properties: scoped_bag(store, cap.key()),
        })
        .collect();

    let properties = store
        .iter()
        .filter(|(name, _)| {
            !name
                .split_once(SCOPE_SEPARATOR)
                .is_some_and(|(prefix, _)| capabilities.contains_key(prefix))
        })
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

    NodeState {
        id: view.id(),
        type_name: view.kind().to_string(),
        parent,
        properties,
        decorators,
        children: view.node().children().to_vec(),
    }
}

fn scoped_bag(store: &PropertyStore, key: &str) -> PropertyBag {
    store
        .scoped(key)
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
