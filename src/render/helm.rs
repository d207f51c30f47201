use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::RenderError;

/// Render a chart with `helm template`, passing values files in order the
/// way `helm -f a -f b` does (later files override earlier ones).
pub fn render_chart(
    chart_path: &Path,
    release_name: &str,
    values: &[PathBuf],
    update_dependencies: bool,
) -> Result<String, RenderError> {
    if update_dependencies && has_dependencies(chart_path) {
        debug!("chart declares dependencies, running `helm dependency build`");
        let output = Command::new("helm")
            .args(["dependency", "build"])
            .arg(chart_path)
            .output()?;
        if !output.status.success() {
            return Err(RenderError::Helm(format!(
                "dependency build: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
    }

    let mut cmd = Command::new("helm");
    cmd.args(["template", release_name]).arg(chart_path);

    for file in values {
        // A values file may exist on only one side of the comparison; Helm
        // treats a missing file as fatal, so skip it here instead.
        if !file.is_file() {
            warn!("values file `{}` not found, skipping", file.display());
            continue;
        }
        cmd.arg("-f").arg(file);
    }

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(RenderError::Helm(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A chart needs `helm dependency build` only when Chart.yaml declares a
/// non-empty dependencies list.
fn has_dependencies(chart_path: &Path) -> bool {
    std::fs::read_to_string(chart_path.join("Chart.yaml"))
        .ok()
        .and_then(|text| serde_yaml::from_str::<serde_yaml::Value>(&text).ok())
        .and_then(|doc| {
            doc.get("dependencies")
                .map(|deps| deps.as_sequence().is_some_and(|seq| !seq.is_empty()))
        })
        .unwrap_or(false)
}
