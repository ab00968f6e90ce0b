//! Capability (decorator) protocol
//!
//! A capability is an attachable unit of data and behaviour. Nodes have no
//! behaviour of their own; what a node *is* (a folder, a file, a piece of
//! text) is the union of the capabilities attached to it.
//!
//! # Lifecycle
//!
//! 1. Constructed on its own, unattached ([`CapabilityCore::owner`] is `None`)
//! 2. Attached to exactly one node by [`ArtifactTree::add_capability`]
//! 3. Used: property access, generation, preview
//! 4. Optionally detached by [`ArtifactTree::remove_capability`]
//!
//! An unattached capability rejects property access with
//! [`ArtifactError::NotAttached`].
//!
//! [`ArtifactTree::add_capability`]: crate::ArtifactTree::add_capability
//! [`ArtifactTree::remove_capability`]: crate::ArtifactTree::remove_capability

use crate::error::{ArtifactError, CapabilityError};
use crate::generate::GenerationContext;
use crate::id::NodeId;
use crate::property::PropertyStore;
use crate::tree::NodeView;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt::{self, Debug, Display, Formatter};

/// Ordering class of a capability's generation step on one node
///
/// Eligible capabilities of a node run sorted by phase, then by attachment
/// order. A folder capability runs in `Prepare` so that the directory exists
/// before any `Emit` capability on the same node writes into it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    /// Structure that later phases rely on (directories)
    Prepare,

    /// Primary output (file contents)
    #[default]
    Emit,

    /// Post-processing of emitted output
    Finalize,
}

impl Display for GenerationPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prepare => "prepare",
            Self::Emit => "emit",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Key and owner handle shared by every capability implementation
///
/// The owner is a non-owning [`NodeId`] handle; the node owns the capability,
/// never the other way round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCore {
    key: String,
    owner: Option<NodeId>,
}

impl CapabilityCore {
    /// Create unattached core with key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: None,
        }
    }

    /// Capability key (unique per node)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Owning node, if attached
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Check if attached
    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn attach(&mut self, owner: NodeId) {
        self.owner = Some(owner);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
    }

    /// Effective store key of one of this capability's properties
    ///
    /// # Errors
    /// Returns `NotAttached` if the capability has no owner
    pub fn scoped_key(&self, name: &str) -> Result<String, ArtifactError> {
        if self.owner.is_none() {
            return Err(ArtifactError::NotAttached {
                key: self.key.clone(),
            });
        }
        PropertyStore::validate_name(name)?;
        Ok(PropertyStore::scoped_key(&self.key, name))
    }

    /// Read one of this capability's properties from its owning node
    ///
    /// # Errors
    /// - `NotAttached` if the capability has no owner
    /// - `ForeignNode` if `node` is not the owner
    pub fn property<'a>(
        &self,
        node: NodeView<'a>,
        name: &str,
    ) -> Result<Option<&'a Value>, ArtifactError> {
        let key = self.scoped_key(name)?;
        self.check_owner(node.id())?;
        Ok(node.properties().get(&key))
    }

    /// Read a string property, treating empty strings as absent
    ///
    /// # Errors
    /// Same as [`property`](Self::property)
    pub fn non_empty_str<'a>(
        &self,
        node: NodeView<'a>,
        name: &str,
    ) -> Result<Option<&'a str>, ArtifactError> {
        Ok(self
            .property(node, name)?
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty()))
    }

    fn check_owner(&self, node: NodeId) -> Result<(), ArtifactError> {
        match self.owner {
            Some(owner) if owner == node => Ok(()),
            Some(owner) => Err(ArtifactError::ForeignNode {
                key: self.key.clone(),
                owner,
                node,
            }),
            None => Err(ArtifactError::NotAttached {
                key: self.key.clone(),
            }),
        }
    }
}

/// Attachable unit of behaviour
///
/// Implementors embed a [`CapabilityCore`] and expose it through
/// [`core`](Self::core)/[`core_mut`](Self::core_mut). Capability data lives
/// in the owning node's [`PropertyStore`] under the capability's namespace,
/// which keeps persisted state flat.
///
/// # Example
/// ```rust,ignore
/// #[derive(Debug)]
/// struct Marker { core: CapabilityCore }
///
/// #[async_trait]
/// impl Capability for Marker {
///     fn type_name(&self) -> &'static str { "Marker" }
///     fn core(&self) -> &CapabilityCore { &self.core }
///     fn core_mut(&mut self) -> &mut CapabilityCore { &mut self.core }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
#[async_trait::async_trait]
pub trait Capability: Send + Sync + Debug + 'static {
    /// Persisted type discriminator
    ///
    /// Must be stable and registered with the factory registry before any
    /// state referencing it is loaded.
    fn type_name(&self) -> &'static str;

    /// Shared key/owner core
    fn core(&self) -> &CapabilityCore;

    /// Mutable access to the shared core
    fn core_mut(&mut self) -> &mut CapabilityCore;

    /// Capability key (unique per node)
    fn key(&self) -> &str {
        self.core().key()
    }

    /// Generation ordering class on one node
    fn phase(&self) -> GenerationPhase {
        GenerationPhase::Emit
    }

    /// Cheap, side-effect free eligibility predicate
    fn can_generate(&self, _node: NodeView<'_>) -> bool {
        false
    }

    /// Perform this capability's side effect
    ///
    /// Only called by the pipeline when [`can_generate`](Self::can_generate)
    /// is true. The default rejects the call as a configuration error.
    async fn generate(&self, _ctx: &GenerationContext<'_>) -> Result<(), CapabilityError> {
        Err(CapabilityError::InvalidState(format!(
            "capability '{}' does not generate output",
            self.key()
        )))
    }

    /// Display text contribution for the owning node
    fn display_text(&self, _node: NodeView<'_>) -> Option<String> {
        None
    }

    /// Display icon contribution for the owning node
    fn display_icon(&self) -> Option<&'static str> {
        None
    }

    /// Extended "previewable" contract, if supported
    fn as_previewable(&self) -> Option<&dyn Previewable> {
        None
    }

    /// Upcast for typed lookup
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed lookup
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Preview produced by a previewable capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Text preview with a syntax hint (usually a file extension)
    Text {
        /// Preview body
        content: String,
        /// Syntax hint, e.g. `"rs"`
        syntax: Option<String>,
    },
}

/// Optional contract for capabilities that can show their output
pub trait Previewable {
    /// Check if a preview can be produced right now
    fn can_preview(&self, node: NodeView<'_>) -> bool;

    /// Produce a preview
    fn create_preview(&self, node: NodeView<'_>) -> Option<Preview>;
}
