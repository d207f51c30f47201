use std::path::Path;
use std::process::Command;

use crate::error::RenderError;

/// The equivalent of `kustomize build <path>`, returning the rendered
/// multi-document YAML stream.
pub fn render(path: &Path) -> Result<String, RenderError> {
    let output = Command::new("kustomize").arg("build").arg(path).output()?;

    if !output.status.success() {
        return Err(RenderError::Kustomize(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
