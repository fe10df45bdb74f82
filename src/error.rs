// src/error.rs

use thiserror::Error;

/// Structural failures of the row cleaner. Bad cell values never end up here;
/// they only drop their row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanError {
    #[error("dataset `{dataset}`: declared column `{column}` not found in header")]
    MissingColumn { dataset: String, column: String },
}

/// Problems found while loading and validating the dataset configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("dataset `{0}` declares no columns")]
    NoColumns(String),

    #[error("dataset `{0}` is declared more than once")]
    DuplicateDataset(String),

    #[error("dataset `{dataset}`: output column `{column}` declared twice")]
    DuplicateColumn { dataset: String, column: String },

    #[error("dataset `{dataset}`, column `{column}`: invalid pattern: {source}")]
    Pattern {
        dataset: String,
        column: String,
        #[source]
        source: regex::Error,
    },

    #[error("dataset `{dataset}`, column `{column}`: {reason}")]
    Column {
        dataset: String,
        column: String,
        reason: String,
    },

    #[error("dataset `{dataset}`: {reason}")]
    Format { dataset: String, reason: String },
}
