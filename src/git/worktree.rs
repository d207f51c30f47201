use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::Error;

/// A read-only materialization of a git ref: a detached linked worktree
/// inside a uniquely-named temporary directory.
///
/// `--detach` lets the snapshot coexist with the caller's checkout even when
/// both point at the same branch. Creation is split in two so the cleanup
/// handle can be registered before any subprocess runs: `prepare` only
/// claims the directory, `materialize` runs `git worktree add`. The snapshot
/// owns the directory and the worktree registration; `close` releases both
/// and is safe to call any number of times from any thread, so it can be
/// driven from both the normal pipeline exit and the interrupt path.
#[derive(Debug)]
pub struct Snapshot {
    repo_root: PathBuf,
    reference: String,
    path: PathBuf,
    dir: Mutex<Option<TempDir>>,
}

impl Snapshot {
    /// Claim the directory that will hold the snapshot, without touching
    /// git. Register the result with cleanup before calling `materialize`
    /// and an interrupt during worktree creation cannot strand anything.
    pub fn prepare(repo_root: &Path, reference: &str) -> Result<Self, Error> {
        let dir = tempfile::Builder::new()
            .prefix("rdv-ref-")
            .tempdir()
            .map_err(|err| Error::SnapshotCreation {
                reference: reference.to_string(),
                detail: err.to_string(),
            })?;
        let path = dir.path().to_path_buf();

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            reference: reference.to_string(),
            path,
            dir: Mutex::new(Some(dir)),
        })
    }

    /// Run `git worktree add --detach` into the prepared directory.
    ///
    /// The dir lock is held for the whole subprocess: a `close` racing this
    /// call blocks until the worktree exists and then removes it, instead of
    /// tearing down an empty directory while the `git` child re-creates it.
    /// A snapshot that was already closed refuses to materialize.
    pub fn materialize(&self) -> Result<(), Error> {
        let guard = match self.dir.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_none() {
            return Err(Error::SnapshotCreation {
                reference: self.reference.clone(),
                detail: "snapshot was already closed".to_string(),
            });
        }

        let output = Command::new("git")
            .args(["worktree", "add", "--detach"])
            .arg(&self.path)
            .arg(&self.reference)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|err| Error::SnapshotCreation {
                reference: self.reference.clone(),
                detail: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::SnapshotCreation {
                reference: self.reference.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            "created worktree snapshot for `{}` at {}",
            self.reference,
            self.path.display()
        );
        Ok(())
    }

    /// `prepare` + `materialize` for callers with no interrupt window to
    /// worry about.
    pub fn open(repo_root: &Path, reference: &str) -> Result<Self, Error> {
        let snapshot = Self::prepare(repo_root, reference)?;
        snapshot.materialize()?;
        Ok(snapshot)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deregister the worktree and remove the temporary directory. Both
    /// steps are best-effort: stale worktree metadata must not mask the
    /// user's actual diff result, so failures are logged and swallowed.
    /// Safe after partial creation; the deregistration simply warns when
    /// there is nothing registered yet.
    pub fn close(&self) {
        let mut guard = match self.dir.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(dir) = guard.take() else {
            return;
        };

        // --force tolerates a directory that was already partially removed.
        let removed = Command::new("git")
            .args(["worktree", "remove", "--force"])
            .arg(dir.path())
            .current_dir(&self.repo_root)
            .output();

        match removed {
            Ok(out) if !out.status.success() => warn!(
                "failed to remove worktree for `{}`, manual `git worktree prune` may be required: {}",
                self.reference,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
            Err(err) => warn!(
                "failed to run `git worktree remove` for `{}`: {err}",
                self.reference
            ),
            _ => debug!("removed worktree snapshot for `{}`", self.reference),
        }

        // `git worktree remove` deletes the directory itself on success; the
        // TempDir covers whatever is left of a partial cleanup.
        if dir.path().exists() {
            if let Err(err) = dir.close() {
                warn!("failed to remove snapshot directory: {err}");
            }
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        self.close();
    }
}
