//! Error types for artifact trees and generation
//!
//! Provides error handling for:
//! - Structural operations (parenting, capability attachment)
//! - Property access through capabilities
//! - Capability generation steps
//! - Whole generation runs (with node/capability/phase location)

use crate::capability::GenerationPhase;
use crate::id::NodeId;
use std::path::PathBuf;

/// Structural and property errors on an [`ArtifactTree`](crate::ArtifactTree)
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Node id not present in the tree
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node id already present in the tree
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// A capability with the same key is already attached
    #[error("duplicate capability key '{key}' on node {node}")]
    DuplicateCapability { node: NodeId, key: String },

    /// No capability with this key on the node
    #[error("capability '{key}' not found on node {node}")]
    CapabilityNotFound { node: NodeId, key: String },

    /// Child already belongs to another parent
    #[error("node {child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    /// Attaching would make a node its own ancestor
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },

    /// The root node cannot be detached or deleted
    #[error("operation not permitted on root node {0}")]
    RootNode(NodeId),

    /// Capability is not attached to any node
    #[error("capability '{key}' is not attached to a node")]
    NotAttached { key: String },

    /// Capability is attached to a different node than the one accessed
    #[error("capability '{key}' belongs to node {owner}, not {node}")]
    ForeignNode {
        key: String,
        owner: NodeId,
        node: NodeId,
    },

    /// Malformed capability key or property name
    #[error("invalid key '{0}'")]
    InvalidKey(String),
}

/// Failure of a single capability's generation step
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Generation requested while `can_generate` is false
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A required sibling capability is missing
    #[error("missing required capability: {required}")]
    MissingCapability { required: String },

    /// Required property is absent or has the wrong shape
    #[error("invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path already written during this run
    #[error("output already written in this run: {0}")]
    DuplicateOutput(PathBuf),

    /// Path exists and overwrite policy forbids replacing it
    #[error("output already exists: {0}")]
    OutputExists(PathBuf),

    /// Output path escapes the output root
    #[error("output path escapes output root: {0}")]
    PathEscapesRoot(PathBuf),

    /// Template rendering failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Structural error while reading the tree
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl CapabilityError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid property error
    pub fn invalid_property(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Template rendering error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Placeholder has no value in the model
    #[error("unresolved placeholder '{0}'")]
    Unresolved(String),

    /// Model has an unsupported shape
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Failure of a generation run, located at the failing node
#[derive(Debug, thiserror::Error)]
#[error("generation failed at node {node}{}: {source}", capability_suffix(.capability.as_deref(), .phase))]
pub struct GenerationError {
    /// Node being generated
    pub node: NodeId,
    /// Capability key, if the failure happened inside a capability
    pub capability: Option<String>,
    /// Phase of the failing capability
    pub phase: Option<GenerationPhase>,
    /// Underlying failure
    #[source]
    pub source: CapabilityError,
}

fn capability_suffix(capability: Option<&str>, phase: &Option<GenerationPhase>) -> String {
    match (capability, phase) {
        (Some(key), Some(phase)) => format!(" (capability '{key}', {phase} phase)"),
        (Some(key), None) => format!(" (capability '{key}')"),
        _ => String::new(),
    }
}

impl GenerationError {
    /// Failure outside any capability (node lookup, structure)
    #[must_use]
    pub fn at_node(node: NodeId, source: impl Into<CapabilityError>) -> Self {
        Self {
            node,
            capability: None,
            phase: None,
            source: source.into(),
        }
    }

    /// Failure inside a capability
    #[must_use]
    pub fn at_capability(
        node: NodeId,
        key: impl Into<String>,
        phase: GenerationPhase,
        source: CapabilityError,
    ) -> Self {
        Self {
            node,
            capability: Some(key.into()),
            phase: Some(phase),
            source,
        }
    }

    /// Check if failure is a configuration error (not retried)
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.source,
            CapabilityError::InvalidState(_)
                | CapabilityError::MissingCapability { .. }
                | CapabilityError::InvalidProperty { .. }
                | CapabilityError::DuplicateOutput(_)
                | CapabilityError::PathEscapesRoot(_)
        )
    }

    /// Check if failure came from the filesystem
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self.source, CapabilityError::Io { .. })
    }
}
