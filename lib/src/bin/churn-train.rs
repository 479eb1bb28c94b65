//! Offline training job: fits the candidates, keeps the best F1 and writes
//! `best_model.bin` and `encoders.bin`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use telco_churn::config::TrainConfig;
use telco_churn::training::TrainingDriver;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "churn-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and select a telco churn classifier", long_about = None)]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Historical customer table (CSV with header)
    #[arg(short, long, env = "CHURN_DATA")]
    data: Option<PathBuf>,

    /// Output directory for the model and encoder artifacts
    #[arg(short, long, env = "CHURN_ARTIFACTS")]
    output: Option<PathBuf>,

    /// Held-out fraction for model comparison
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Seed for the split
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => TrainConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrainConfig::default(),
    };
    if let Some(data) = args.data {
        config.data = data;
    }
    if let Some(output) = args.output {
        config.artifacts_dir = output;
    }
    if let Some(fraction) = args.test_fraction {
        config.test_fraction = fraction;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    info!("churn-train v{}", env!("CARGO_PKG_VERSION"));
    info!(
        data = %config.data.display(),
        output = %config.artifacts_dir.display(),
        candidates = config.candidates.len(),
        "training configuration"
    );

    let driver = TrainingDriver::new(config).context("Invalid training configuration")?;
    let (outcome, paths) = driver.run().context("Training failed")?;

    let best = outcome.selected_result();
    info!(
        "best model '{}' (f1 = {:.4}) saved to {}",
        best.kind,
        best.metrics.f1,
        paths.model.display()
    );
    Ok(())
}
