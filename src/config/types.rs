// src/config/types.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::table::ColumnType;

/// Top level of `datasets.yaml`, as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_plots_dir")]
    pub plots_dir: PathBuf,
    pub datasets: Vec<DatasetEntry>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_database() -> PathBuf {
    PathBuf::from("data/data.sqlite")
}
fn default_plots_dir() -> PathBuf {
    PathBuf::from("data/plots")
}

/// Where the raw bytes of a dataset come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceEntry {
    Http {
        url: String,
    },
    Kaggle {
        owner: String,
        dataset: String,
        file: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    CelsiusToFahrenheit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateEntry {
    /// Inclusive numeric bounds; either side may be open.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Strictly greater than zero.
    Positive,
    OneOf {
        values: Vec<String>,
    },
    Pattern {
        regex: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemporalEntry {
    Year {
        column: String,
    },
    Date {
        column: String,
        #[serde(default = "default_date_format")]
        format: String,
    },
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    /// Header in the source file, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<PredicateEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub source: SourceEntry,
    /// File inside a downloaded archive; defaults to the first `.csv` entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_member: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_decimal")]
    pub decimal: char,
    /// Sentinels on top of the built-in `""`, `"nan"` and `"#"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentinels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temporal: Vec<TemporalEntry>,
    #[serde(default = "default_cutoff_year")]
    pub cutoff_year: i32,
    pub columns: Vec<ColumnEntry>,
    /// Target table; defaults to the dataset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default)]
    pub write_mode: WriteMode,
}

fn default_delimiter() -> char {
    ','
}
fn default_decimal() -> char {
    '.'
}
fn default_cutoff_year() -> i32 {
    2012
}
