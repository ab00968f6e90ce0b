//! Testing utilities for the Skein workspace
//!
//! Shared capabilities, progress collectors and tree fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use skein_artifact::{
    ArtifactTree, Capability, CapabilityCore, CapabilityError, GenerationContext, GenerationPhase,
    NodeId, NodeView, ProgressEvent, ProgressObserver,
};
use std::any::Any;
use std::sync::Arc;

/// Discriminator of [`Recording`]
pub const RECORDING_TYPE: &str = "Recording";

/// Shared log of `(node, key)` generate calls, in call order
pub type CallLog = Arc<Mutex<Vec<(NodeId, String)>>>;

/// Capability that records every generate call
#[derive(Debug)]
pub struct Recording {
    core: CapabilityCore,
    eligible: bool,
    phase: GenerationPhase,
    output: Option<(String, String)>,
    log: CallLog,
}

impl Recording {
    pub fn new(key: &str) -> Self {
        Self {
            core: CapabilityCore::new(key),
            eligible: true,
            phase: GenerationPhase::Emit,
            output: None,
            log: CallLog::default(),
        }
    }

    /// Share a log with other recorders to observe global order
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    pub fn eligible(mut self, eligible: bool) -> Self {
        self.eligible = eligible;
        self
    }

    pub fn with_phase(mut self, phase: GenerationPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Write `text` to `path` (relative to the output root) when generating
    pub fn writing(mut self, path: &str, text: &str) -> Self {
        self.output = Some((path.to_string(), text.to_string()));
        self
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    pub fn calls(&self) -> usize {
        self.log.lock().len()
    }
}

#[async_trait::async_trait]
impl Capability for Recording {
    fn type_name(&self) -> &'static str {
        RECORDING_TYPE
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn phase(&self) -> GenerationPhase {
        self.phase
    }

    fn can_generate(&self, _node: NodeView<'_>) -> bool {
        self.eligible
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<(), CapabilityError> {
        self.log
            .lock()
            .push((ctx.node().id(), self.key().to_string()));
        if let Some((path, text)) = &self.output {
            ctx.write_text(path, text).await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Progress observer keeping every event
#[derive(Debug, Clone, Default)]
pub struct ProgressCollector {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Events reported for one node
    pub fn for_node(&self, node: NodeId) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.node == node)
            .cloned()
            .collect()
    }
}

impl ProgressObserver for ProgressCollector {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}

/// Build a tree from a parent table
///
/// Node `i + 1` is attached under node `parents[i] % (i + 1)`, where node 0
/// is the root. Returns the tree and all ids in creation order.
pub fn tree_from_parents(parents: &[usize]) -> (ArtifactTree, Vec<NodeId>) {
    let mut tree = ArtifactTree::new();
    let mut ids = vec![tree.root()];
    for (i, choice) in parents.iter().enumerate() {
        let parent = ids[choice % (i + 1)];
        let id = tree.create_node();
        tree.add_child(parent, id).unwrap();
        ids.push(id);
    }
    (tree, ids)
}

/// Root with `width` children, each with `width` grandchildren
pub fn two_level_tree(width: usize) -> (ArtifactTree, Vec<NodeId>) {
    let mut tree = ArtifactTree::new();
    let root = tree.root();
    let mut ids = vec![root];
    for _ in 0..width {
        let child = tree.create_node();
        tree.add_child(root, child).unwrap();
        ids.push(child);
        for _ in 0..width {
            let grandchild = tree.create_node();
            tree.add_child(child, grandchild).unwrap();
            ids.push(grandchild);
        }
    }
    (tree, ids)
}

/// Ids of the subtree in pre-order
pub fn pre_order_ids(tree: &ArtifactTree, root: NodeId) -> Vec<NodeId> {
    tree.pre_order(root).map(|v| v.id()).collect()
}

/// Set a string property in `key`'s namespace
pub fn set_scoped(tree: &mut ArtifactTree, node: NodeId, key: &str, name: &str, value: &str) {
    tree.set_capability_property(node, key, name, serde_json::Value::from(value))
        .unwrap();
}
