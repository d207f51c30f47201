use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rdv",
    version,
    about = "Render Helm charts and Kustomize overlays, then diff them against a target git ref"
)]
pub struct Cli {
    /// Relative path to the chart or kustomization directory
    #[arg(short = 'p', long, default_value = ".")]
    pub path: PathBuf,

    /// Target git ref to compare against; its remote-tracking branch is used
    /// when one exists
    #[arg(short = 'r', long = "ref")]
    pub reference: Option<String>,

    /// Additional values file, relative to the chart path (repeatable)
    #[arg(short = 'f', long = "values")]
    pub values: Vec<String>,

    /// Validate the locally rendered manifests with kubeconform
    #[arg(short = 'v', long)]
    pub validate: bool,

    /// Update Helm chart dependencies before rendering
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Structural diff of parsed documents instead of a line diff
    #[arg(short = 's', long)]
    pub semantic: bool,

    /// Output in plain style without any highlighting
    #[arg(long)]
    pub plain: bool,

    /// Enable verbose logging for debugging
    #[arg(long)]
    pub debug: bool,
}
