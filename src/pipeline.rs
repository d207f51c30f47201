use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::info;

use crate::diff::{self, DiffStrategy};
use crate::git::{RepoCache, Snapshot};
use crate::orchestrator;
use crate::path::resolve_repo_path;
use crate::render::validate::Validator;
use crate::render::{RenderInput, Renderer};
use crate::report;

/// Everything the pipeline needs that came from flags and config.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub cwd: PathBuf,
    pub path: PathBuf,
    pub reference: String,
    pub values: Vec<String>,
    pub strategy: DiffStrategy,
    pub plain: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub has_differences: bool,
    pub report: String,
}

/// Cleanup actions that must run even when the process is interrupted.
/// Snapshots are registered as soon as their directory exists, before the
/// worktree subprocess runs; releasing is
/// idempotent because each snapshot carries its own once-guard, so both the
/// normal exit path and the signal path may call `release_all`.
#[derive(Clone, Default)]
pub struct CleanupRegistry {
    snapshots: Arc<Mutex<Vec<Arc<Snapshot>>>>,
}

impl CleanupRegistry {
    pub fn register(&self, snapshot: Arc<Snapshot>) {
        let mut guard = match self.snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(snapshot);
    }

    pub fn release_all(&self) {
        let mut guard = match self.snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for snapshot in guard.drain(..) {
            snapshot.close();
        }
    }
}

/// The whole run: resolve the path, snapshot the target ref, render both
/// sides, diff, and format the report. The snapshot is closed before this
/// returns on every path; an interrupt arriving mid-run is covered by the
/// registry instead.
pub async fn run(
    options: PipelineOptions,
    renderer: Arc<dyn Renderer>,
    validator: Option<Arc<dyn Validator>>,
    cleanup: CleanupRegistry,
) -> Result<RunOutcome> {
    let repo = RepoCache::open(&options.cwd)?;
    let repo_root = repo.workdir().to_path_buf();

    let relative = resolve_repo_path(&options.path, &repo_root, &options.cwd)?;
    let resolved_ref = repo.resolve_target_ref(&options.reference);
    repo.verify_ref(&resolved_ref)?;

    info!("starting diff against git ref `{resolved_ref}`");

    // Registered before the worktree subprocess starts, so an interrupt
    // arriving during `git worktree add` still tears everything down.
    let snapshot = Arc::new(Snapshot::prepare(&repo_root, &resolved_ref)?);
    cleanup.register(Arc::clone(&snapshot));
    if let Err(err) = snapshot.materialize() {
        snapshot.close();
        return Err(err.into());
    }

    let local_input = RenderInput::anchored(&repo_root, &relative, &options.values);
    let target_input = RenderInput::anchored(snapshot.path(), &relative, &options.values);

    let outcome = render_and_diff(
        &options,
        renderer,
        validator,
        local_input,
        target_input,
        &resolved_ref,
        &relative,
    )
    .await;

    // Cleanup runs before any render/diff error propagates.
    snapshot.close();
    outcome
}

async fn render_and_diff(
    options: &PipelineOptions,
    renderer: Arc<dyn Renderer>,
    validator: Option<Arc<dyn Validator>>,
    local_input: RenderInput,
    target_input: RenderInput,
    resolved_ref: &str,
    relative: &std::path::Path,
) -> Result<RunOutcome> {
    let (local_text, target_text) =
        orchestrator::render_both(renderer, validator, local_input, target_input).await?;

    // Absence means the path is new; diff against nothing.
    let target_text = target_text.unwrap_or_default();

    let target_label = format!("{resolved_ref}/{}", relative.display());
    let local_label = format!("local/{}", relative.display());

    let result = diff::compute(
        options.strategy,
        &target_text,
        &local_text,
        &target_label,
        &local_label,
    )?;

    let mut buf = Vec::new();
    let has_differences = report::print(&result, resolved_ref, options.plain, &mut buf)?;
    let report = String::from_utf8(buf).context("report is not valid UTF-8")?;

    Ok(RunOutcome {
        has_differences,
        report,
    })
}
