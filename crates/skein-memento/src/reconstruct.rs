//! Snapshot → tree
//!
//! Reconstruction validates the whole snapshot before building anything,
//! then builds into a fresh [`ArtifactTree`] that is only returned on
//! success. Callers never observe a partially restored tree.

use crate::error::MementoError;
use crate::registry::FactoryRegistry;
use crate::state::{NodeState, WorkspaceState};
use skein_artifact::{ArtifactNode, ArtifactTree, Capability, NodeId, SCOPE_SEPARATOR};
use std::collections::{HashMap, HashSet};

/// Rebuild a tree from a snapshot using `registry`'s constructors
///
/// Node records may appear in any order; child order comes from each
/// record's `children` list and capability order from its `decorators`.
///
/// # Errors
/// - `UnsupportedVersion` for unknown format versions
/// - `MalformedState` for inconsistent structure
/// - `UnknownNodeType` / `UnknownCapabilityType` for unregistered discriminators
/// - `Artifact` if a rebuilt capability rejects its key or properties
pub fn reconstruct(
    state: &WorkspaceState,
    registry: &FactoryRegistry,
) -> Result<ArtifactTree, MementoError> {
    state.check_version()?;
    let index = validate(state)?;

    let mut built: HashMap<NodeId, (ArtifactNode, Vec<Box<dyn Capability>>)> =
        HashMap::with_capacity(index.len());
    for record in &state.nodes {
        let mut node = registry.construct_node(record)?;
        node.properties_mut().extend(
            record
                .properties
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        let capabilities = record
            .decorators
            .iter()
            .map(|d| registry.construct_capability(record.id, d))
            .collect::<Result<Vec<_>, _>>()?;
        built.insert(record.id, (node, capabilities));
    }

    let (root_node, root_caps) = built
        .remove(&state.root)
        .ok_or_else(|| MementoError::malformed("root record vanished"))?;
    let mut tree = ArtifactTree::with_root(root_node);
    let mut pending = vec![(state.root, root_caps)];
    for (id, (node, caps)) in built {
        tree.insert_node(node)?;
        pending.push((id, caps));
    }

    for (id, caps) in pending {
        for cap in caps {
            tree.add_capability_boxed(id, cap)?;
        }
        let record = index[&id];
        for decorator in &record.decorators {
            for (name, value) in &decorator.properties {
                tree.set_capability_property(id, &decorator.key, name, value.clone())?;
            }
        }
    }

    // parents before children
    let mut stack = vec![state.root];
    while let Some(parent) = stack.pop() {
        let children = &index[&parent].children;
        for &child in children {
            tree.add_child(parent, child)?;
        }
        stack.extend(children.iter().rev());
    }

    tracing::debug!(root = %state.root, nodes = tree.len(), "reconstructed tree");
    Ok(tree)
}

/// Structural checks; returns records indexed by id
fn validate(state: &WorkspaceState) -> Result<HashMap<NodeId, &NodeState>, MementoError> {
    let mut index = HashMap::with_capacity(state.nodes.len());
    for record in &state.nodes {
        if index.insert(record.id, record).is_some() {
            return Err(MementoError::malformed(format!(
                "duplicate node id {}",
                record.id
            )));
        }
        check_namespaces(record)?;
    }

    let root = index
        .get(&state.root)
        .ok_or_else(|| MementoError::malformed(format!("root {} has no record", state.root)))?;
    if let Some(parent) = root.parent {
        return Err(MementoError::malformed(format!(
            "root {} claims parent {parent}",
            state.root
        )));
    }

    let mut listed = HashSet::new();
    for record in &state.nodes {
        for child in &record.children {
            let child_record = index.get(child).ok_or_else(|| {
                MementoError::malformed(format!("node {} lists missing child {child}", record.id))
            })?;
            if child_record.parent != Some(record.id) {
                return Err(MementoError::malformed(format!(
                    "node {child} is listed under {} but records parent {:?}",
                    record.id, child_record.parent
                )));
            }
            if !listed.insert(*child) {
                return Err(MementoError::malformed(format!(
                    "node {child} is listed as a child more than once"
                )));
            }
        }
    }
    for record in &state.nodes {
        if record.parent.is_some() && !listed.contains(&record.id) {
            return Err(MementoError::malformed(format!(
                "node {} records a parent that does not list it",
                record.id
            )));
        }
    }

    // every child has exactly one listing parent, so reaching all records
    // from the root also rules out cycles
    let mut reached = 0usize;
    let mut stack = vec![state.root];
    let mut seen = HashSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            return Err(MementoError::malformed(format!("cycle through node {id}")));
        }
        reached += 1;
        stack.extend(index[&id].children.iter().copied());
    }
    if reached != state.nodes.len() {
        return Err(MementoError::malformed(format!(
            "{} of {} records are unreachable from root {}",
            state.nodes.len() - reached,
            state.nodes.len(),
            state.root
        )));
    }

    Ok(index)
}

fn check_namespaces(record: &NodeState) -> Result<(), MementoError> {
    let mut keys = HashSet::new();
    for decorator in &record.decorators {
        if !keys.insert(decorator.key.as_str()) {
            return Err(MementoError::malformed(format!(
                "node {} has capability key '{}' twice",
                record.id, decorator.key
            )));
        }
    }
    for name in record.properties.keys() {
        if let Some((prefix, _)) = name.split_once(SCOPE_SEPARATOR) {
            if keys.contains(prefix) {
                return Err(MementoError::malformed(format!(
                    "node-level property '{name}' on {} collides with capability '{prefix}'",
                    record.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DecoratorState;

    fn linked(root: NodeId, children: &[NodeId]) -> Vec<NodeState> {
        let mut root_state = NodeState::new(root, "Artifact");
        root_state.children = children.to_vec();
        let mut nodes = vec![root_state];
        for &child in children {
            let mut s = NodeState::new(child, "Artifact");
            s.parent = Some(root);
            nodes.push(s);
        }
        nodes
    }

    #[test]
    fn records_in_any_order() {
        let root = NodeId::new();
        let (a, b) = (NodeId::new(), NodeId::new());
        let mut nodes = linked(root, &[a, b]);
        nodes.reverse();
        let tree = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new()).unwrap();
        assert_eq!(tree.root(), root);
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let root = NodeId::new();
        let mut nodes = linked(root, &[]);
        nodes.push(nodes[0].clone());
        let err = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new());
        assert!(matches!(err, Err(MementoError::MalformedState(_))));
    }

    #[test]
    fn missing_root_rejected() {
        let nodes = linked(NodeId::new(), &[]);
        let err = reconstruct(&WorkspaceState::new(NodeId::new(), nodes), &FactoryRegistry::new());
        assert!(matches!(err, Err(MementoError::MalformedState(_))));
    }

    #[test]
    fn parent_mismatch_rejected() {
        let root = NodeId::new();
        let child = NodeId::new();
        let mut nodes = linked(root, &[child]);
        nodes[1].parent = Some(NodeId::new());
        let err = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new());
        assert!(matches!(err, Err(MementoError::MalformedState(_))));
    }

    #[test]
    fn orphan_record_rejected() {
        let root = NodeId::new();
        let mut nodes = linked(root, &[]);
        nodes.push(NodeState::new(NodeId::new(), "Artifact"));
        let err = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new());
        assert!(matches!(err, Err(MementoError::MalformedState(m)) if m.contains("unreachable")));
    }

    #[test]
    fn namespace_collision_rejected() {
        let root = NodeId::new();
        let mut nodes = linked(root, &[]);
        nodes[0]
            .decorators
            .push(DecoratorState::new("Anything", "Folder"));
        nodes[0]
            .properties
            .insert("Folder.Name".into(), "x".into());
        let err = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new());
        assert!(matches!(err, Err(MementoError::MalformedState(_))));
    }

    #[test]
    fn unknown_node_type_fails_whole_load() {
        let root = NodeId::new();
        let child = NodeId::new();
        let mut nodes = linked(root, &[child]);
        nodes[1].type_name = "UnknownType".into();
        let err = reconstruct(&WorkspaceState::new(root, nodes), &FactoryRegistry::new());
        assert!(matches!(
            err,
            Err(MementoError::UnknownNodeType { type_name, node })
                if type_name == "UnknownType" && node == child
        ));
    }
}
