//! Subcommands against state files on disk

use pretty_assertions::assert_eq;
use skein_artifact::{ArtifactTree, CancellationToken, Capability, OverwritePolicy};
use skein_cli::commands::{self, RunStatus};
use skein_cli::{GenerateArgs, SkeinConfig, StateArgs};
use skein_decorators::{FileHost, FolderHost};
use skein_memento::{capture_tree, save_state, DecoratorState, FactoryRegistry};
use skein_test_utils::{Recording, RECORDING_TYPE};
use std::path::{Path, PathBuf};

fn sample_tree() -> ArtifactTree {
    let mut tree = ArtifactTree::new();
    let root = tree.root();
    let src = FolderHost::create(&mut tree, root, "src").unwrap().node_id();
    FileHost::create(&mut tree, src, "hello.txt")
        .unwrap()
        .set_text("hello")
        .unwrap();
    tree
}

async fn write_state(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let state = capture_tree(&sample_tree()).unwrap();
    save_state(&path, &state).await.unwrap();
    path
}

fn generate_args(state: PathBuf, out: &Path) -> GenerateArgs {
    GenerateArgs {
        state,
        out: Some(out.to_path_buf()),
        dry_run: false,
        overwrite: None,
    }
}

#[tokio::test]
async fn generate_from_yaml_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), "ws.yaml").await;
    let out = dir.path().join("out");

    let summary = commands::generate(
        &generate_args(state, &out),
        &SkeinConfig::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.report.files_written, vec![out.join("src/hello.txt")]);
    assert_eq!(std::fs::read_to_string(out.join("src/hello.txt")).unwrap(), "hello");
}

#[tokio::test]
async fn configuration_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), "ws.json").await;
    let out = dir.path().join("out");
    std::fs::create_dir_all(out.join("src")).unwrap();
    std::fs::write(out.join("src/hello.txt"), "old").unwrap();

    let mut config = SkeinConfig::default();
    config.generation = config
        .generation
        .with_output_root(&out)
        .with_overwrite(OverwritePolicy::Skip);
    let args = GenerateArgs {
        state,
        out: None,
        dry_run: false,
        overwrite: None,
    };

    let summary = commands::generate(&args, &config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.report.files_skipped, vec![out.join("src/hello.txt")]);
    assert_eq!(std::fs::read_to_string(out.join("src/hello.txt")).unwrap(), "old");
}

#[tokio::test]
async fn cancelled_before_start_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), "ws.json").await;
    let out = dir.path().join("out");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = commands::generate(&generate_args(state, &out), &SkeinConfig::default(), &cancel)
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Cancelled);
    assert!(summary.report.files_written.is_empty());
    assert!(!out.exists());
}

#[tokio::test]
async fn inspect_prints_tree_and_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), "ws.json").await;

    let text = commands::inspect(&StateArgs { state }).await.unwrap();
    assert!(text.contains("[folder] src (Folder)"));
    assert!(text.contains("[file] hello.txt (File) {FileProperties, TextContent}"));
    assert!(text.lines().last().unwrap().starts_with("fingerprint "));
}

#[tokio::test]
async fn validate_accepts_captured_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = write_state(dir.path(), "ws.yml").await;

    let summary = commands::validate(&StateArgs { state }).await.unwrap();
    assert_eq!(summary.nodes, 3);
    assert!(summary.canonical);
}

#[tokio::test]
async fn types_registered_globally_are_loadable() {
    FactoryRegistry::global().register_capability(RECORDING_TYPE, |state: &DecoratorState| {
        Ok(Box::new(Recording::new(&state.key)) as Box<dyn Capability>)
    });
    let mut tree = sample_tree();
    let root = tree.root();
    tree.add_capability(root, Recording::new("Plugin")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ws.json");
    save_state(&path, &capture_tree(&tree).unwrap()).await.unwrap();

    let summary = commands::validate(&StateArgs { state: path.clone() })
        .await
        .unwrap();
    assert_eq!(summary.nodes, 3);
    assert!(summary.canonical);
    let text = commands::inspect(&StateArgs { state: path }).await.unwrap();
    assert!(text.lines().next().unwrap().contains("{Plugin}"));
}

#[tokio::test]
async fn unknown_type_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_state(dir.path(), "ws.json").await;
    let text = std::fs::read_to_string(&path)
        .unwrap()
        .replace("\"Folder\"", "\"UnknownType\"");
    std::fs::write(&path, text).unwrap();

    let err = commands::validate(&StateArgs { state: path }).await.unwrap_err();
    assert!(format!("{err:#}").contains("UnknownType"));
}
