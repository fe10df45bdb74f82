use anyhow::Result;
use datasweep::{
    clean::{clean_table_with_report, CleanReport},
    config::{DatasetSpec, PipelineConfig},
    fetch, process,
    store::TableStore,
};
use reqwest::Client;
use std::{env, fs, path::Path};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CONFIG: &str = "datasets.yaml";

/// Parse, clean and store one acquired dataset. Runs on the blocking pool.
fn load_dataset(spec: &DatasetSpec, data: &[u8], database: &Path) -> Result<(CleanReport, usize)> {
    let raw = process::load_csv(data, spec.delimiter)?;
    let (table, report) = clean_table_with_report(&raw, spec)?;
    let mut store = TableStore::open(database)?;
    let written = store.write_table(&spec.table, &table, spec.write_mode)?;
    Ok((report, written))
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,datasweep=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config & configure dirs ─────────────────────────────
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = PipelineConfig::load(&config_path)?;
    fs::create_dir_all(&config.data_dir)?;

    let client = Client::new();
    let mut failed = Vec::new();

    // ─── 3) acquire → parse → clean → store, one dataset at a time ───
    for spec in config.datasets {
        let name = spec.name.clone();
        let start = Instant::now();

        let data = match fetch::acquire(&client, &spec, &config.data_dir).await {
            Ok(d) => d,
            Err(e) => {
                error!(dataset = %name, "acquire failed: {:#}", e);
                failed.push(name);
                continue;
            }
        };

        let database = config.database.clone();
        let table = spec.table.clone();
        match tokio::task::spawn_blocking(move || load_dataset(&spec, &data, &database)).await? {
            Ok((report, written)) => {
                info!(
                    dataset = %name,
                    table = %table,
                    rows_in = report.rows_in,
                    rows_out = report.rows_out,
                    written,
                    dropped_temporal = report.dropped_temporal,
                    dropped_missing = report.dropped_missing,
                    dropped_predicate = report.dropped_predicate,
                    dropped_cast = report.dropped_cast,
                    elapsed = ?start.elapsed(),
                    "stored"
                );
                if report.rows_in > 0 && report.rows_out == 0 {
                    warn!(dataset = %name, "every row was dropped");
                }
            }
            Err(e) => {
                error!(dataset = %name, "load failed: {:#}", e);
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        info!("all datasets stored in {}", config.database.display());
    } else {
        error!(?failed, "some datasets were not stored");
    }
    Ok(())
}
