use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline errors. Each variant names the stage that failed so the
/// single diagnostic line printed on exit tells the user where to look.
#[derive(Debug, Error)]
pub enum Error {
    #[error("the provided path `{path}` is outside the git repository root `{root}`")]
    OutOfRepository { path: PathBuf, root: PathBuf },

    #[error("invalid or non-existent ref `{reference}`: {detail}")]
    InvalidRevision { reference: String, detail: String },

    #[error("failed to create worktree snapshot for `{reference}`: {detail}")]
    SnapshotCreation { reference: String, detail: String },

    #[error("failed to render {side} manifests: {source}")]
    Render { side: Side, source: RenderError },

    #[error("manifest validation failed:\n{report}")]
    Validation { report: String },

    #[error("semantic diff failed: {detail}")]
    DiffEngine { detail: String },
}

/// Which side of the comparison an error came from. The local side is the
/// caller's working tree, the target side the worktree snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Target => write!(f, "target ref"),
        }
    }
}

/// Renderer-boundary errors. `SourceNotFound` is its own variant because the
/// orchestrator downgrades it to "no prior output" on the target side only.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no Helm chart or kustomization found at `{0}`")]
    SourceNotFound(PathBuf),

    #[error("helm: {0}")]
    Helm(String),

    #[error("kustomize: {0}")]
    Kustomize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// True when the failure means the source simply does not exist at the
    /// rendered revision, as opposed to a broken chart or a missing tool.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RenderError::SourceNotFound(_))
    }
}
