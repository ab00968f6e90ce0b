//! Skein Artifact Trees
//!
//! Artifact nodes whose behaviour is assembled from attachable capabilities,
//! plus the pipeline that materialises a tree into files.
//!
//! # Core Concepts
//!
//! - [`ArtifactTree`]: Arena owning every node; parent links are [`NodeId`] handles
//! - [`ArtifactNode`]: Ordered children, a [`CapabilityCollection`] and a [`PropertyStore`]
//! - [`Capability`]: Attachable unit of behaviour with a node-unique key
//! - [`Host`]: Typed façade over "this node, as a `C`"
//! - [`Generator`]: Async pre-order walk running eligible capabilities
//!
//! # Example
//!
//! ```rust,ignore
//! use skein_artifact::{ArtifactTree, Generator, GenerationConfig, NullProgress};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut tree = ArtifactTree::new();
//! let src = tree.create_node();
//! tree.add_child(tree.root(), src)?;
//! tree.add_capability(src, FolderCapability::new())?;
//!
//! let outcome = Generator::new(&tree, GenerationConfig::new("out"))
//!     .generate(tree.root(), &NullProgress, &CancellationToken::new())
//!     .await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod capability;
mod collection;
mod error;
mod host;
mod id;
mod node;
mod property;
mod tree;

/// Generation pipeline
pub mod generate;

#[cfg(test)]
mod testing;

// Re-exports
pub use capability::{Capability, CapabilityCore, GenerationPhase, Preview, Previewable};
pub use collection::CapabilityCollection;
pub use error::{ArtifactError, CapabilityError, GenerationError, RenderError};
pub use generate::{
    GenerationConfig, GenerationContext, GenerationOutcome, GenerationReport, Generator,
    NullProgress, OverwritePolicy, ProgressEvent, ProgressObserver, TemplateRenderer,
    VerbatimRenderer, WriteOutcome,
};
pub use host::Host;
pub use id::NodeId;
pub use node::{ArtifactNode, DEFAULT_NODE_KIND};
pub use property::{PropertyStore, SCOPE_SEPARATOR};
pub use tree::{Ancestors, ArtifactTree, Descendants, NodeView, PreOrder, DEFAULT_ICON};

/// Re-export so capability implementors share one `async_trait`
pub use async_trait::async_trait;

/// Re-export so callers share one cancellation token type
pub use tokio_util::sync::CancellationToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
