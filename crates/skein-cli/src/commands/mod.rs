//! Subcommand implementations

mod generate;
mod inspect;
mod validate;

pub use generate::{run as generate, GenerateSummary, RunStatus};
pub use inspect::{render_tree, run as inspect};
pub use validate::{run as validate, ValidationSummary};

use anyhow::Context;
use skein_artifact::ArtifactTree;
use skein_decorators::global_registry;
use skein_memento::{load_state, reconstruct, WorkspaceState};
use std::path::Path;

/// Load a state file and rebuild its tree
///
/// Uses the process-wide registry: builtins plus anything a plugin
/// registered into [`skein_memento::FactoryRegistry::global`].
pub(crate) async fn load_tree(path: &Path) -> anyhow::Result<(WorkspaceState, ArtifactTree)> {
    let state = load_state(path)
        .await
        .with_context(|| format!("loading {}", path.display()))?;
    let tree = reconstruct(&state, global_registry())
        .with_context(|| format!("reconstructing {}", path.display()))?;
    Ok((state, tree))
}

