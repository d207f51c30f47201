use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::Error;

/// Schema validation of a rendered manifest stream. Consumed only for the
/// local render, and only when the user asked for it.
pub trait Validator: Send + Sync {
    fn validate(&self, manifest: &str) -> Result<(), Error>;
}

/// Pipes the manifest stream to `kubeconform` on stdin. CRDs are skipped
/// because their schemas are by definition not in the default registry.
pub struct Kubeconform {
    pub debug: bool,
}

impl Validator for Kubeconform {
    fn validate(&self, manifest: &str) -> Result<(), Error> {
        let mut cmd = Command::new("kubeconform");
        cmd.args(["-strict", "-skip", "CustomResourceDefinition"]);
        if self.debug {
            cmd.arg("-verbose");
        }
        run_with_stdin(cmd, manifest)
    }
}

/// Feed the manifest to the validator on stdin and collect its verdict.
/// The child is always reaped, including when the pipe breaks mid-write.
fn run_with_stdin(mut cmd: Command, manifest: &str) -> Result<(), Error> {
    let tool = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|err| Error::Validation {
        report: format!("failed to run {tool}: {err}"),
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(manifest.as_bytes()) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Validation {
                report: format!("failed to feed manifests to {tool}: {err}"),
            });
        }
    }

    let output = child.wait_with_output().map_err(|err| Error::Validation {
        report: format!("failed to wait for {tool}: {err}"),
    })?;

    if !output.status.success() {
        let mut report = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !report.is_empty() {
                report.push('\n');
            }
            report.push_str(stderr.trim());
        }
        return Err(Error::Validation { report });
    }

    Ok(())
}
