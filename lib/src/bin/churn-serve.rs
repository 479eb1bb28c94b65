//! HTTP inference server over the trained artifacts.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use telco_churn::config::ServeConfig;
use telco_churn::service::http::serve;
use telco_churn::service::{init_artifacts, InferenceService, LoadedArtifacts};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "churn-serve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve telco churn predictions over HTTP", long_about = None)]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding best_model.bin and encoders.bin
    #[arg(short, long, env = "CHURN_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "CHURN_BIND")]
    bind: Option<SocketAddr>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug,tower_http=debug"
    } else {
        "info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => ServeConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ServeConfig::default(),
    };
    if let Some(dir) = args.artifacts {
        config.artifacts_dir = dir;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let artifacts = LoadedArtifacts::load_dir(&config.artifacts_dir).with_context(|| {
        format!(
            "Failed to load artifacts from {}",
            config.artifacts_dir.display()
        )
    })?;
    init_artifacts(artifacts).context("Failed to install artifacts")?;
    let service = InferenceService::from_global().context("Artifacts are not installed")?;

    serve(service, config.bind).await
}
