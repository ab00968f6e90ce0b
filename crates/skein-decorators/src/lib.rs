//! Skein Builtin Decorators
//!
//! Capabilities that turn artifact nodes into folders and text files.
//!
//! # Core Concepts
//!
//! - [`FolderCapability`]: Creates a directory named by `Folder.Name`
//! - [`FileCapability`]: Names the file a node materialises as
//! - [`TextContentCapability`]: Writes literal or templated text into that file
//! - [`FolderHost`] / [`FileHost`]: Typed construction helpers
//! - [`register_builtin`] / [`global_registry`]: Makes all of the above reconstructible

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod file;
mod folder;
mod hosts;
mod register;
mod render;
mod text;

pub use file::{FileCapability, FILE_KEY, FILE_NAME, FILE_NODE_KIND};
pub use folder::{resolve_directory, FolderCapability, FOLDER_KEY, FOLDER_NODE_KIND, NAME};
pub use hosts::{FileHost, FolderHost};
pub use register::{builtin_registry, global_registry, register_builtin};
pub use render::PlaceholderRenderer;
pub use text::{TextContentCapability, TextSource, TEMPLATE, TEXT, TEXT_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
