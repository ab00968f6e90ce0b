//! Flat, serialisable snapshots
//!
//! A workspace is persisted as a flat list of [`NodeState`] records. Tree
//! shape is expressed through `parent` and ordered `children` id lists, not
//! nesting, so the serializer never recurses with tree depth.

use crate::error::MementoError;
use crate::fingerprint::StateFingerprint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skein_artifact::NodeId;
use std::collections::BTreeMap;

/// Current persisted format version
pub const FORMAT_VERSION: u32 = 1;

/// Property bag with deterministic ordering
pub type PropertyBag = BTreeMap<String, Value>;

/// Snapshot of one capability: discriminator, key, its namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratorState {
    /// Capability discriminator
    pub type_name: String,
    /// Key on the owning node
    pub key: String,
    /// Capability-scoped properties, names without prefix
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,
}

impl DecoratorState {
    /// Create state without properties
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
            properties: PropertyBag::new(),
        }
    }

    /// Add a property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Get a property
    #[inline]
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Snapshot of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    /// Stable node id
    pub id: NodeId,
    /// Node discriminator
    pub type_name: String,
    /// Parent id; `None` for the snapshot root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Node-level properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,
    /// Capabilities in attachment order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<DecoratorState>,
    /// Child ids in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

impl NodeState {
    /// Create state without properties, capabilities or children
    #[inline]
    #[must_use]
    pub fn new(id: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            parent: None,
            properties: PropertyBag::new(),
            decorators: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Decorator state by key
    #[must_use]
    pub fn decorator(&self, key: &str) -> Option<&DecoratorState> {
        self.decorators.iter().find(|d| d.key == key)
    }
}

/// Versioned snapshot of a whole (sub)tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    /// Persisted format version
    pub format_version: u32,
    /// Id of the snapshot root
    pub root: NodeId,
    /// Flat node list (pre-order when produced by capture)
    pub nodes: Vec<NodeState>,
}

impl WorkspaceState {
    /// Create state at the current format version
    #[inline]
    #[must_use]
    pub fn new(root: NodeId, nodes: Vec<NodeState>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            root,
            nodes,
        }
    }

    /// Node state by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of node records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if there are no node records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reject versions this build cannot read
    ///
    /// # Errors
    /// Returns `UnsupportedVersion` for any version but [`FORMAT_VERSION`]
    pub fn check_version(&self) -> Result<(), MementoError> {
        if self.format_version == FORMAT_VERSION {
            Ok(())
        } else {
            Err(MementoError::UnsupportedVersion {
                found: self.format_version,
                supported: FORMAT_VERSION,
            })
        }
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    /// Returns `Json` if encoding fails
    pub fn to_json(&self) -> Result<String, MementoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and check the version
    ///
    /// # Errors
    /// - `Json` if decoding fails
    /// - `UnsupportedVersion` for unknown versions
    pub fn from_json(text: &str) -> Result<Self, MementoError> {
        let state: Self = serde_json::from_str(text)?;
        state.check_version()?;
        Ok(state)
    }

    /// Encode as YAML
    ///
    /// # Errors
    /// Returns `Yaml` if encoding fails
    pub fn to_yaml(&self) -> Result<String, MementoError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Decode from YAML and check the version
    ///
    /// # Errors
    /// - `Yaml` if decoding fails
    /// - `UnsupportedVersion` for unknown versions
    pub fn from_yaml(text: &str) -> Result<Self, MementoError> {
        let state: Self = serde_yaml::from_str(text)?;
        state.check_version()?;
        Ok(state)
    }

    /// Content fingerprint over the canonical JSON encoding
    ///
    /// # Errors
    /// Returns `Json` if encoding fails
    pub fn fingerprint(&self) -> Result<StateFingerprint, MementoError> {
        StateFingerprint::of_serializable(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> WorkspaceState {
        let root = NodeId::new();
        let child = NodeId::new();
        let mut root_state = NodeState::new(root, "Artifact");
        root_state.children.push(child);
        let mut child_state = NodeState::new(child, "File");
        child_state.parent = Some(root);
        child_state
            .decorators
            .push(DecoratorState::new("FileCapability", "FileProperties").with_property("FileName", "a.txt"));
        WorkspaceState::new(root, vec![root_state, child_state])
    }

    #[test]
    fn json_roundtrip() {
        let state = sample();
        let text = state.to_json().unwrap();
        assert!(text.contains("\"typeName\""));
        assert!(text.contains("\"formatVersion\": 1"));
        assert_eq!(WorkspaceState::from_json(&text).unwrap(), state);
    }

    #[test]
    fn yaml_roundtrip() {
        let state = sample();
        let text = state.to_yaml().unwrap();
        assert_eq!(WorkspaceState::from_yaml(&text).unwrap(), state);
    }

    #[test]
    fn unknown_version_rejected() {
        let mut state = sample();
        state.format_version = 99;
        let text = serde_json::to_string(&state).unwrap();
        assert!(matches!(
            WorkspaceState::from_json(&text),
            Err(MementoError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn lookups() {
        let state = sample();
        let child = state.nodes[1].id;
        let node = state.node(child).unwrap();
        assert_eq!(
            node.decorator("FileProperties").unwrap().property("FileName"),
            Some(&json!("a.txt"))
        );
        assert!(node.decorator("Missing").is_none());
        assert_eq!(state.len(), 2);
    }
}
