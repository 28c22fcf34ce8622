use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use corpus_pipeline::{aggregate, FsStore, Overrides, Settings};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "corpus_analyzer", about = "Aggregate processed documents into a corpus report")]
struct Cli {
    /// TOML settings file (default: ./corpus.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Root holding raw/, processed/, status/ and analysis/
    #[arg(long)]
    shared_root: Option<PathBuf>,
    /// How often to check for the processing manifest
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Give up waiting for the processing manifest after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings::load(&Overrides {
        config_file: cli.config,
        shared_root: cli.shared_root,
        poll_interval_ms: cli.poll_interval_ms,
        wait_timeout_secs: cli.timeout_secs,
        throttle_ms: None,
    })
    .context("Failed to load settings")?;
    info!(settings = ?settings, "Starting corpus analyzer");

    let store = FsStore::new(&settings);
    let report = aggregate::run(&store, &settings)
        .await
        .inspect_err(|e| error!(error = %e, "corpus analysis failed"))
        .context("Corpus analysis failed")?;

    println!(
        "Analyzed {} documents: {} words, {} unique, {} similarity pairs.",
        report.documents_processed,
        report.total_words,
        report.unique_words,
        report.document_similarity.len()
    );
    Ok(())
}
