pub mod helm;
pub mod kustomize;
pub mod validate;

use std::path::{Path, PathBuf};

use crate::error::RenderError;

/// Everything one side of the comparison needs: the source directory plus
/// the values files resolved against it. Two instances exist per run, one
/// anchored in the working tree and one inside the snapshot, sharing the
/// same repo-relative subpath and values names.
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub root: PathBuf,
    pub values: Vec<PathBuf>,
}

impl RenderInput {
    /// Anchor the repo-relative `subpath` and values file names at `base`.
    pub fn anchored(base: &Path, subpath: &Path, values: &[String]) -> Self {
        let root = base.join(subpath);
        let values = values.iter().map(|name| root.join(name)).collect();
        Self { root, values }
    }
}

/// Turns a manifest source directory into a rendered YAML stream. The core
/// pipeline only sees this boundary; tests substitute a fake.
pub trait Renderer: Send + Sync {
    fn render(&self, input: &RenderInput) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Helm,
    Kustomize,
}

/// Marker-file detection, checked in the rendered tree itself so a path that
/// is absent at the target ref comes back as `SourceNotFound`.
fn detect(root: &Path) -> Option<SourceKind> {
    if root.join("Chart.yaml").is_file() {
        return Some(SourceKind::Helm);
    }
    for marker in ["kustomization.yaml", "kustomization.yml", "Kustomization"] {
        if root.join(marker).is_file() {
            return Some(SourceKind::Kustomize);
        }
    }
    None
}

/// Production renderer: shells out to `helm template` or `kustomize build`
/// depending on what the directory contains.
pub struct ManifestRenderer {
    pub release_name: String,
    pub update_dependencies: bool,
}

impl Renderer for ManifestRenderer {
    fn render(&self, input: &RenderInput) -> Result<String, RenderError> {
        match detect(&input.root) {
            Some(SourceKind::Helm) => helm::render_chart(
                &input.root,
                &self.release_name,
                &input.values,
                self.update_dependencies,
            ),
            Some(SourceKind::Kustomize) => kustomize::render(&input.root),
            None => Err(RenderError::SourceNotFound(input.root.clone())),
        }
    }
}
