// src/process/mod.rs
pub mod date_parser;
pub mod utils;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::{debug, warn};

use crate::table::RawTable;
use utils::clean_header;

/// Parse a delimited text buffer with a header row into a [`RawTable`].
///
/// - bytes are decoded as UTF-8, invalid sequences replaced
/// - records may have any number of fields (`flexible`)
/// - empty header names left by a trailing delimiter are dropped
#[tracing::instrument(level = "debug", skip(data), fields(bytes = data.len()))]
pub fn load_csv(data: &[u8], delimiter: u8) -> Result<RawTable> {
    let text = String::from_utf8_lossy(data);
    if let std::borrow::Cow::Owned(_) = text {
        warn!("input is not valid UTF-8; invalid bytes replaced");
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(clean_header)
        .collect();
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
    if headers.is_empty() {
        bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "parsed CSV");
    Ok(RawTable::new(headers, rows))
}

/// Read a CSV file from disk and parse it with [`load_csv`].
pub fn load_csv_file<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<RawTable> {
    let data = fs::read(&path)
        .with_context(|| format!("Failed to read CSV file: {:?}", path.as_ref()))?;
    load_csv(&data, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,datasweep::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn test_load_semicolon_with_decimal_comma() -> Result<()> {
        init_test_logging();
        let content = "EVA_NR;DS100;IFOPT;NAME;Verkehr;Laenge;Breite;Betreiber_Name;Betreiber_Nr;Status\n\
8000001;KA;de:08212:1;Aachen Hbf;FV;6,091499;50,7678;DB Station und Service AG;1;\n\
8000002;KAA;de:08212:2;Aalen;RV;10,0988;48,841;DB Station und Service AG;1;neu\n";

        let table = load_csv(content.as_bytes(), b';')?;
        assert_eq!(table.headers.len(), 10);
        assert_eq!(table.headers[0], "EVA_NR");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][5], "6,091499");
        assert_eq!(table.rows[0][9], "");
        assert_eq!(table.rows[1][9], "neu");
        Ok(())
    }

    #[test]
    fn test_trailing_delimiter_and_ragged_rows() -> Result<()> {
        init_test_logging();
        let content = "\u{feff}Geraet;Hersteller;Model;\n1;acme;t1;\n2;acme\n3;acme;t3;extra;more\n";
        let table = load_csv(content.as_bytes(), b';')?;
        assert_eq!(table.headers, vec!["Geraet", "Hersteller", "Model"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.rows[2][3], "extra");
        Ok(())
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() -> Result<()> {
        let content = "area,mean_salary\n\"city, of london\",\"£52,203\"\n";
        let table = load_csv(content.as_bytes(), b',')?;
        assert_eq!(table.rows[0], vec!["city, of london", "£52,203"]);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced() -> Result<()> {
        let mut content = b"name,temp\n".to_vec();
        content.extend_from_slice(&[0xff, b'x', b',', b'1', b'\n']);
        let table = load_csv(&content, b',')?;
        assert_eq!(table.rows[0][0], "\u{fffd}x");
        Ok(())
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(load_csv(b"", b',').is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"a,b\n1,2\n")?;
        let table = load_csv_file(tmp.path(), b',')?;
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
        Ok(())
    }
}
