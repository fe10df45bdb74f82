// src/bin/analyse.rs
//! Export the London analysis result sets from the cleaned store.
//! Usage: analyse [CONFIG]

use anyhow::Result;
use datasweep::{analyse, config::PipelineConfig, store::TableStore};
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let config_path = env::args().nth(1).unwrap_or_else(|| "datasets.yaml".to_string());
    let config = PipelineConfig::load(&config_path)?;
    let store = TableStore::open(&config.database)?;

    let done = analyse::run_all(&store, &config.plots_dir)?;

    println!("{:<24} {:>8}", "query", "rows");
    for (name, rows) in &done {
        println!("{:<24} {:>8}", name, rows);
    }
    info!(
        exported = done.len(),
        skipped = analyse::QUERIES.len() - done.len(),
        "analysis written to {}",
        config.plots_dir.display()
    );
    Ok(())
}
