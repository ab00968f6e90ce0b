use super::load_tree;
use crate::cli::StateArgs;
use anyhow::ensure;
use skein_decorators::builtin_registry;
use skein_memento::{capture_tree, reconstruct, StateFingerprint};
use std::fmt;

/// Result of `skein validate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub nodes: usize,
    pub fingerprint: StateFingerprint,
    /// File already in canonical (pre-order) form
    pub canonical: bool,
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valid: {} nodes, fingerprint {}", self.nodes, self.fingerprint.short())?;
        if !self.canonical {
            write!(f, " (not in canonical order; re-save to normalise)")?;
        }
        Ok(())
    }
}

/// Reconstruct a workspace and check the capture/reconstruct round trip
///
/// # Errors
/// Returns an error if the state is invalid or the round trip is not stable
pub async fn run(args: &StateArgs) -> anyhow::Result<ValidationSummary> {
    let (state, tree) = load_tree(&args.state).await?;
    let first = capture_tree(&tree)?;
    let second = capture_tree(&reconstruct(&first, &builtin_registry())?)?;
    ensure!(first == second, "capture/reconstruct round trip is not stable");
    ensure!(
        first.len() == state.len(),
        "reconstructed {} nodes from {} records",
        first.len(),
        state.len()
    );

    let canonical = first == state;
    tracing::info!(nodes = first.len(), canonical, "workspace valid");
    Ok(ValidationSummary {
        nodes: first.len(),
        fingerprint: first.fingerprint()?,
        canonical,
    })
}
