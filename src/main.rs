use std::env;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rdv::cli::Cli;
use rdv::config;
use rdv::diff::DiffStrategy;
use rdv::pipeline::{self, CleanupRegistry, PipelineOptions, RunOutcome};
use rdv::render::validate::{Kubeconform, Validator};
use rdv::render::{ManifestRenderer, Renderer};

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = execute(cli).await;

    match result {
        Ok(outcome) => {
            print!("{}", outcome.report);
            let _ = std::io::stdout().flush();
        }
        Err(err) => {
            eprintln!("rdv: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<RunOutcome> {
    let config = config::load_config();

    let options = PipelineOptions {
        cwd: env::current_dir()?,
        path: cli.path.clone(),
        reference: cli
            .reference
            .clone()
            .or(config.reference)
            .unwrap_or_else(|| "main".to_string()),
        values: cli.values.clone(),
        strategy: if cli.semantic || config.semantic.unwrap_or(false) {
            DiffStrategy::Semantic
        } else {
            DiffStrategy::Unified
        },
        plain: cli.plain || config.plain.unwrap_or(false),
    };

    let renderer: Arc<dyn Renderer> = Arc::new(ManifestRenderer {
        release_name: config
            .release_name
            .unwrap_or_else(|| "release".to_string()),
        update_dependencies: cli.update,
    });
    let validator: Option<Arc<dyn Validator>> = cli
        .validate
        .then(|| Arc::new(Kubeconform { debug: cli.debug }) as Arc<dyn Validator>);

    // The registry outlives the pipeline task so an interrupt arriving while
    // the worktree or renders are in flight still tears the snapshot down.
    let cleanup = CleanupRegistry::default();
    let mut pipeline = tokio::spawn(pipeline::run(
        options,
        renderer,
        validator,
        cleanup.clone(),
    ));

    let joined = tokio::select! {
        joined = &mut pipeline => Some(joined),
        _ = shutdown_signal() => None,
    };

    let Some(joined) = joined else {
        eprintln!("rdv: interrupted, cleaning up");
        // Let an in-flight worktree creation or render reach its next await
        // point before teardown, so no orphaned `git` child re-creates what
        // the registry just removed.
        pipeline.abort();
        let _ = pipeline.await;
        cleanup.release_all();
        std::process::exit(1);
    };

    let result = match joined {
        Ok(outcome) => outcome,
        Err(err) => Err(anyhow::anyhow!("pipeline task failed: {err}")),
    };

    // Normal completion already closed the snapshot; this is a no-op then,
    // and the real teardown when the pipeline errored out early.
    cleanup.release_all();

    result
}
