// src/fetch/zips.rs
use anyhow::{anyhow, Context, Result};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Whether `data` starts like a zip archive.
pub fn is_zip(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Pull one CSV out of an in-memory zip.
///
/// With `member` set, the entry whose name (or final path component) equals
/// it is returned; otherwise the first `.csv` entry in archive order.
pub fn extract_csv(data: &[u8], member: Option<&str>) -> Result<(String, Vec<u8>)> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).context("Failed to read ZIP archive")?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{}", i))?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();
        let base = name.rsplit('/').next().unwrap_or(&name);
        let wanted = match member {
            Some(m) => name == m || base == m,
            None => name.to_lowercase().ends_with(".csv"),
        };
        if wanted {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .with_context(|| format!("Failed to read {} into memory", name))?;
            debug!(entry = %name, bytes = buf.len(), "extracted");
            return Ok((name, buf));
        }
    }

    Err(match member {
        Some(m) => anyhow!("ZIP has no entry named {}", m),
        None => anyhow!("ZIP has no .csv entry"),
    })
}

/// Return the CSV bytes of a payload, unpacking it first if it is a zip.
pub fn unpack(data: Vec<u8>, member: Option<&str>) -> Result<Vec<u8>> {
    if is_zip(&data) {
        extract_csv(&data, member).map(|(_, b)| b)
    } else {
        Ok(data)
    }
}
