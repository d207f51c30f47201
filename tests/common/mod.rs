// Shared between integration test binaries; not every binary uses every
// helper.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Run git with identity configured inline so the fixture works on a bare CI
/// machine.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=rdv-tests",
            "-c",
            "user.email=rdv-tests@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A throwaway repository with one commit on `main` containing
/// `manifests/app.yaml`.
pub fn fixture_repo(app_yaml: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    // Canonicalize so paths compare cleanly against git's view of the repo
    // when the system temp directory is behind a symlink.
    let root = dir.path().canonicalize().expect("failed to canonicalize");

    git(&root, &["init", "--initial-branch=main"]);
    std::fs::create_dir_all(root.join("manifests")).unwrap();
    std::fs::write(root.join("manifests/app.yaml"), app_yaml).unwrap();
    git(&root, &["add", "."]);
    git(&root, &["commit", "-m", "initial manifests"]);

    (dir, root)
}
