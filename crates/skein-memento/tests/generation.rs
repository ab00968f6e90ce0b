//! Generating trees rebuilt from snapshots

use pretty_assertions::assert_eq;
use serde_json::Value;
use skein_artifact::{
    ArtifactTree, CancellationToken, Capability, GenerationConfig, GenerationPhase, Generator,
    NodeId, NullProgress,
};
use skein_memento::{capture_tree, reconstruct, DecoratorState, FactoryRegistry};
use skein_test_utils::{
    pre_order_ids, set_scoped, two_level_tree, CallLog, Recording, RECORDING_TYPE,
};
use std::sync::Arc;

const ELIGIBLE: &str = "Eligible";
const PHASE: &str = "Phase";

/// Rebuilds recorders onto one shared log, reading gating and phase from
/// their persisted properties
fn recording_registry(log: &CallLog) -> FactoryRegistry {
    let registry = FactoryRegistry::new();
    let log = Arc::clone(log);
    registry.register_capability(RECORDING_TYPE, move |state: &DecoratorState| {
        let eligible = state
            .property(ELIGIBLE)
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let phase = match state.property(PHASE).and_then(Value::as_str) {
            Some("prepare") => GenerationPhase::Prepare,
            Some("finalize") => GenerationPhase::Finalize,
            _ => GenerationPhase::Emit,
        };
        let recorder = Recording::new(&state.key)
            .with_log(&log)
            .eligible(eligible)
            .with_phase(phase);
        Ok(Box::new(recorder) as Box<dyn Capability>)
    });
    registry
}

/// root -> (c1 -> (g1, g2), c2 -> (g3, g4)); every node records as "Main",
/// c1 adds "Late" then "Early", g3 adds an ineligible "Skipped"
fn recorded_tree() -> (ArtifactTree, Vec<NodeId>) {
    let (mut tree, ids) = two_level_tree(2);
    for &id in &ids {
        tree.add_capability(id, Recording::new("Main")).unwrap();
    }
    let (c1, g3) = (ids[1], ids[5]);
    tree.add_capability(c1, Recording::new("Late")).unwrap();
    set_scoped(&mut tree, c1, "Late", PHASE, "finalize");
    tree.add_capability(c1, Recording::new("Early")).unwrap();
    set_scoped(&mut tree, c1, "Early", PHASE, "prepare");
    tree.add_capability(g3, Recording::new("Skipped")).unwrap();
    tree.set_capability_property(g3, "Skipped", ELIGIBLE, false)
        .unwrap();
    (tree, ids)
}

#[tokio::test]
async fn rebuilt_tree_runs_in_pre_order_and_phase_order() {
    let (tree, ids) = recorded_tree();
    let log = CallLog::default();
    let rebuilt = reconstruct(&capture_tree(&tree).unwrap(), &recording_registry(&log)).unwrap();
    assert_eq!(pre_order_ids(&rebuilt, rebuilt.root()), ids);

    let out = tempfile::tempdir().unwrap();
    let outcome = Generator::new(&rebuilt, GenerationConfig::new(out.path()))
        .generate(rebuilt.root(), &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let mut expected = Vec::new();
    for &id in &ids {
        if id == ids[1] {
            expected.push((id, "Early".to_string()));
            expected.push((id, "Main".to_string()));
            expected.push((id, "Late".to_string()));
        } else {
            expected.push((id, "Main".to_string()));
        }
    }
    assert_eq!(log.lock().clone(), expected);
    assert_eq!(outcome.report().capabilities_run, expected.len());
    assert!(log.lock().iter().all(|(_, key)| key != "Skipped"));
}

#[tokio::test]
async fn recorder_output_written_under_root() {
    let (mut tree, ids) = two_level_tree(1);
    let writer = Recording::new("Out").writing("nested/out.txt", "done");
    let log = writer.log();
    tree.add_capability(ids[2], writer).unwrap();
    tree.add_capability(ids[1], Recording::new("Idle").with_log(&log).eligible(false))
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    Generator::new(&tree, GenerationConfig::new(out.path()))
        .generate(tree.root(), &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(out.path().join("nested/out.txt")).unwrap(),
        "done"
    );
    assert_eq!(log.lock().clone(), vec![(ids[2], "Out".to_string())]);
    assert_eq!(tree.capability::<Recording>(ids[2]).unwrap().calls(), 1);
}
