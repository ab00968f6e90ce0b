//! Skein Memento
//!
//! Flat snapshots of artifact trees and their type-keyed reconstruction.
//!
//! # Core Concepts
//!
//! - [`WorkspaceState`]: Versioned flat list of [`NodeState`] records
//! - [`DecoratorState`]: One capability's discriminator, key and namespace
//! - [`FactoryRegistry`]: Discriminator → constructor tables
//! - [`capture`] / [`reconstruct`]: Tree ↔ snapshot, all-or-nothing on load
//!
//! Round-trip law: for any tree `t`,
//! `capture_tree(&reconstruct(&capture_tree(&t)?, &registry)?)? == capture_tree(&t)?`
//! provided every discriminator in `t` is registered.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod capture;
mod document;
mod error;
mod fingerprint;
mod reconstruct;
mod registry;
mod state;

pub use capture::{capture, capture_tree};
pub use document::{load_state, save_state, StateFormat};
pub use error::MementoError;
pub use fingerprint::{FingerprintError, StateFingerprint};
pub use reconstruct::reconstruct;
pub use registry::{CapabilityConstructor, FactoryRegistry, NodeConstructor, Restorable};
pub use state::{DecoratorState, NodeState, PropertyBag, WorkspaceState, FORMAT_VERSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
