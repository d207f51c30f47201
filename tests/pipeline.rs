mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::fixture_repo;
use rdv::diff::DiffStrategy;
use rdv::error::RenderError;
use rdv::pipeline::{run, CleanupRegistry, PipelineOptions};
use rdv::render::{RenderInput, Renderer};

/// Stands in for helm/kustomize: "rendering" is reading `app.yaml` from the
/// source directory, and a directory without one has no renderable source.
struct FileRenderer;

impl Renderer for FileRenderer {
    fn render(&self, input: &RenderInput) -> Result<String, RenderError> {
        let file = input.root.join("app.yaml");
        if !file.is_file() {
            return Err(RenderError::SourceNotFound(input.root.clone()));
        }
        Ok(std::fs::read_to_string(file)?)
    }
}

fn options(root: &std::path::Path, strategy: DiffStrategy) -> PipelineOptions {
    PipelineOptions {
        cwd: root.to_path_buf(),
        path: PathBuf::from("manifests"),
        reference: "main".to_string(),
        values: Vec::new(),
        strategy,
        plain: true,
    }
}

const DEPLOYMENT_V2: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
";

const DEPLOYMENT_V3: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 3
";

#[tokio::test]
async fn modified_manifest_diffs_under_both_strategies() {
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);
    std::fs::write(root.join("manifests/app.yaml"), DEPLOYMENT_V3).unwrap();

    let outcome = run(
        options(&root, DiffStrategy::Unified),
        Arc::new(FileRenderer),
        None,
        CleanupRegistry::default(),
    )
    .await
    .unwrap();
    assert!(outcome.has_differences);
    assert!(outcome.report.contains("-  replicas: 2"));
    assert!(outcome.report.contains("+  replicas: 3"));

    let outcome = run(
        options(&root, DiffStrategy::Semantic),
        Arc::new(FileRenderer),
        None,
        CleanupRegistry::default(),
    )
    .await
    .unwrap();
    assert!(outcome.has_differences);
    assert!(outcome.report.contains("~ apps/v1/Deployment web"));
    assert!(outcome.report.contains("spec.replicas: 2 -> 3"));
}

#[tokio::test]
async fn identical_sides_report_no_differences() {
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);

    let outcome = run(
        options(&root, DiffStrategy::Unified),
        Arc::new(FileRenderer),
        None,
        CleanupRegistry::default(),
    )
    .await
    .unwrap();
    assert!(!outcome.has_differences);
    assert!(outcome
        .report
        .contains("No differences found between rendered manifests."));
}

#[tokio::test]
async fn path_new_in_working_tree_diffs_against_nothing() {
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);

    // A manifest directory that does not exist at the target ref.
    std::fs::create_dir_all(root.join("new-app")).unwrap();
    std::fs::write(root.join("new-app/app.yaml"), DEPLOYMENT_V3).unwrap();

    let mut opts = options(&root, DiffStrategy::Unified);
    opts.path = PathBuf::from("new-app");

    let outcome = run(opts, Arc::new(FileRenderer), None, CleanupRegistry::default())
        .await
        .unwrap();
    assert!(outcome.has_differences);
    // Everything is additive.
    let additions = outcome
        .report
        .lines()
        .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
        .count();
    assert_eq!(additions, DEPLOYMENT_V3.lines().count());
    assert!(outcome
        .report
        .lines()
        .all(|l| !l.starts_with('-') || l.starts_with("---")));
}

#[tokio::test]
async fn pipeline_leaves_no_snapshot_behind() {
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);

    let registry = CleanupRegistry::default();
    run(
        options(&root, DiffStrategy::Unified),
        Arc::new(FileRenderer),
        None,
        registry.clone(),
    )
    .await
    .unwrap();

    // Normal completion already tore the snapshot down; the signal-path
    // release must be a harmless no-op.
    registry.release_all();

    let worktrees = std::process::Command::new("git")
        .args(["worktree", "list"])
        .current_dir(&root)
        .output()
        .unwrap();
    let listing = String::from_utf8_lossy(&worktrees.stdout).to_string();
    assert_eq!(
        listing.lines().count(),
        1,
        "expected only the main worktree, got:\n{listing}"
    );
}

#[tokio::test]
async fn interrupted_pipeline_cleans_up_via_the_registry() {
    // Simulate an interrupt arriving after the snapshot was created: the
    // registry, not the pipeline, runs cleanup.
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);

    let snapshot = Arc::new(rdv::git::Snapshot::open(&root, "main").unwrap());
    let path = snapshot.path().to_path_buf();

    let registry = CleanupRegistry::default();
    registry.register(Arc::clone(&snapshot));

    registry.release_all();
    assert!(!path.exists());

    // And the pipeline-side close that never got to run stays a no-op.
    snapshot.close();
}

#[tokio::test]
async fn path_outside_the_repository_is_rejected() {
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);

    let mut opts = options(&root, DiffStrategy::Unified);
    opts.path = PathBuf::from("../outside");

    let err = run(opts, Arc::new(FileRenderer), None, CleanupRegistry::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("outside the git repository root"));
}

#[tokio::test]
async fn broken_local_render_is_fatal_and_still_cleans_up() {
    struct Broken;
    impl Renderer for Broken {
        fn render(&self, _input: &RenderInput) -> Result<String, RenderError> {
            Err(RenderError::Helm("template oops".into()))
        }
    }

    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);
    let registry = CleanupRegistry::default();

    let err = run(
        options(&root, DiffStrategy::Unified),
        Arc::new(Broken),
        None,
        registry.clone(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("local"));

    let worktrees = std::process::Command::new("git")
        .args(["worktree", "list"])
        .current_dir(&root)
        .output()
        .unwrap();
    assert_eq!(
        String::from_utf8_lossy(&worktrees.stdout).lines().count(),
        1
    );
}

#[tokio::test]
async fn target_ref_content_comes_from_the_commit() {
    // Working tree is dirty with v3 while main has v2; the target side must
    // render v2 even though the same branch is checked out.
    let (_dir, root) = fixture_repo(DEPLOYMENT_V2);
    std::fs::write(root.join("manifests/app.yaml"), DEPLOYMENT_V3).unwrap();

    let outcome = run(
        options(&root, DiffStrategy::Semantic),
        Arc::new(FileRenderer),
        None,
        CleanupRegistry::default(),
    )
    .await
    .unwrap();
    assert!(outcome.report.contains("spec.replicas: 2 -> 3"));
}
