// src/fetch/mod.rs
//! Dataset acquisition: local cache, HTTP or Kaggle download, zip unpacking.

pub mod http;
pub mod kaggle;
pub mod zips;

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs, time::Instant};
use tracing::{info, instrument};
use url::Url;

use crate::config::{DatasetSpec, SourceEntry};

/// Directory a dataset's downloads are kept in.
pub fn dataset_dir(data_dir: &Path, spec: &DatasetSpec) -> PathBuf {
    data_dir.join(&spec.name)
}

/// First file under the dataset directory whose name contains the
/// dataset's file name.
pub fn find_cached(data_dir: &Path, spec: &DatasetSpec) -> Result<Option<PathBuf>> {
    let dir = dataset_dir(data_dir, spec);
    if !dir.is_dir() {
        return Ok(None);
    }
    let pattern = format!(
        "{}/**/*{}*",
        Pattern::escape(&dir.display().to_string()),
        Pattern::escape(&spec.file_name())
    );
    for entry in glob(&pattern)?.flatten() {
        if entry.is_file() {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Resolve the download URL and credentials for a source.
pub fn source_url(source: &SourceEntry) -> Result<(Url, Option<http::BasicAuth>)> {
    Ok(match source {
        SourceEntry::Http { url } => (
            Url::parse(url).with_context(|| format!("parsing source URL {:?}", url))?,
            None,
        ),
        SourceEntry::Kaggle {
            owner,
            dataset,
            file,
        } => (
            kaggle::file_url(owner, dataset, file)?,
            Some(kaggle::credentials()?),
        ),
    })
}

/// Return the raw CSV bytes of a dataset, downloading it unless a cached copy
/// exists. Downloads are kept under `data_dir/<dataset>/`.
#[instrument(level = "info", skip(client, spec, data_dir), fields(dataset = %spec.name))]
pub async fn acquire(client: &Client, spec: &DatasetSpec, data_dir: &Path) -> Result<Vec<u8>> {
    let member = spec.archive_member.as_deref();

    if let Some(path) = find_cached(data_dir, spec)? {
        info!(path = %path.display(), "using cached file");
        let data = fs::read(&path)
            .await
            .with_context(|| format!("reading cached {:?}", path))?;
        return zips::unpack(data, member);
    }

    let (url, auth) = source_url(&spec.source)?;
    info!(%url, "downloading");
    let start = Instant::now();
    let data = http::get_bytes_with_retry(
        client,
        &url,
        auth.as_ref(),
        http::MAX_RETRIES,
        http::INITIAL_BACKOFF_MS,
    )
    .await?;
    info!(bytes = data.len(), elapsed = ?start.elapsed(), "downloaded");

    let dir = dataset_dir(data_dir, spec);
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("creating {:?}", dir))?;
    let dest = dir.join(spec.file_name());
    fs::write(&dest, &data)
        .await
        .with_context(|| format!("writing {:?}", dest))?;

    zips::unpack(data, member)
}
