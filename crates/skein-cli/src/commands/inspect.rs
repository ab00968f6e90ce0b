use super::load_tree;
use crate::cli::StateArgs;
use skein_artifact::{ArtifactTree, NodeId};
use std::fmt::Write;

/// Load a workspace and render it for display
///
/// # Errors
/// Returns an error if the state cannot be loaded, reconstructed or hashed
pub async fn run(args: &StateArgs) -> anyhow::Result<String> {
    let (state, tree) = load_tree(&args.state).await?;
    let fingerprint = state.fingerprint()?;
    let mut out = render_tree(&tree);
    let _ = write!(out, "fingerprint {fingerprint}");
    Ok(out)
}

/// One line per node, indented by depth: `[icon] text (kind) {capability keys}`
#[must_use]
pub fn render_tree(tree: &ArtifactTree) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(tree.root(), 0)];
    while let Some((id, depth)) = stack.pop() {
        let Some(view) = tree.view(id) else { continue };
        let keys: Vec<&str> = view.capabilities().keys().collect();
        let _ = write!(
            out,
            "{:indent$}[{}] {} ({})",
            "",
            view.display_icon(),
            view.display_text(),
            view.kind(),
            indent = depth * 2
        );
        if !keys.is_empty() {
            let _ = write!(out, " {{{}}}", keys.join(", "));
        }
        out.push('\n');
        stack.extend(view.node().children().iter().rev().map(|&c| (c, depth + 1)));
    }
    out
}
