use anyhow::{Context, Result};
use git2::{BranchType, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Error;

pub struct RepoCache {
    repo: Repository,
    workdir: PathBuf,
}

impl RepoCache {
    pub fn open(path: &Path) -> Result<Self> {
        let repo =
            Repository::discover(path).context("Not a git repository (or any parent directory)")?;
        let workdir = repo
            .workdir()
            .context("Bare repositories are not supported")?
            .to_path_buf();
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolve the user-supplied ref to its remote-tracking counterpart when
    /// one exists, e.g. `main` -> `origin/main`, so the diff runs against
    /// what was actually pushed. Falls back to the literal ref when no
    /// upstream is configured.
    pub fn resolve_target_ref(&self, refname: &str) -> String {
        if !wants_upstream_lookup(refname) {
            return refname.to_string();
        }

        let upstream = self
            .repo
            .find_branch(refname, BranchType::Local)
            .ok()
            .and_then(|branch| branch.upstream().ok())
            .and_then(|upstream| {
                upstream
                    .name()
                    .ok()
                    .flatten()
                    .map(|name| name.to_string())
            });

        match upstream {
            Some(name) => {
                debug!("found upstream for `{refname}`, using `{name}`");
                name
            }
            None => {
                debug!("no upstream found for `{refname}`, using local ref");
                refname.to_string()
            }
        }
    }

    /// Check the ref resolves to an object before any snapshot work starts.
    pub fn verify_ref(&self, refname: &str) -> Result<(), Error> {
        match self.repo.revparse_single(refname) {
            Ok(_) => Ok(()),
            Err(err) => Err(Error::InvalidRevision {
                reference: refname.to_string(),
                detail: err.message().to_string(),
            }),
        }
    }
}

/// Only bare branch names get the remote-tracking lookup; anything already
/// qualified with a `/` or the literal working-tree marker is taken as-is.
/// Known rough edge: a local branch like `feature/x` with no remote never
/// gets the lookup either.
fn wants_upstream_lookup(refname: &str) -> bool {
    !refname.contains('/') && refname != "HEAD"
}
