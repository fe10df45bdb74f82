// src/config/mod.rs

pub mod types;

use chrono::format::{Item, StrftimeItems};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::clean::predicate::Predicate;
use crate::error::ConfigError;
use crate::table::ColumnType;

pub use types::{
    ColumnEntry, DatasetEntry, PipelineFile, PredicateEntry, SourceEntry, TemporalEntry,
    Transform, WriteMode,
};

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub plots_dir: PathBuf,
    pub datasets: Vec<DatasetSpec>,
}

/// How a row's effective year is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalKind {
    Year,
    /// `chrono` format string, e.g. `%Y-%m-%d`.
    Date(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFilter {
    pub column: String,
    pub kind: TemporalKind,
}

/// One declared output column.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Output name.
    pub name: String,
    /// Header in the raw file.
    pub source: String,
    pub ty: ColumnType,
    pub predicates: Vec<Predicate>,
    pub transform: Option<Transform>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
            ty,
            predicates: Vec::new(),
            transform: None,
        }
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Everything the cleaner and the collaborators around it need to know about
/// one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub name: String,
    pub source: SourceEntry,
    pub archive_member: Option<String>,
    pub delimiter: u8,
    pub decimal: char,
    pub sentinels: Vec<String>,
    pub temporal: Vec<TemporalFilter>,
    pub cutoff_year: i32,
    pub columns: Vec<ColumnSpec>,
    pub table: String,
    pub write_mode: WriteMode,
}

impl DatasetSpec {
    /// Bare spec for an HTTP source with `,` delimiter and `.` decimals.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            source: SourceEntry::Http {
                url: String::new(),
            },
            name,
            archive_member: None,
            delimiter: b',',
            decimal: '.',
            sentinels: Vec::new(),
            temporal: Vec::new(),
            cutoff_year: 2012,
            columns,
            write_mode: WriteMode::Replace,
        }
    }

    /// Validate a raw config entry: compile patterns, check names and
    /// type/predicate combinations.
    pub fn from_entry(entry: DatasetEntry) -> Result<Self, ConfigError> {
        let dataset = entry.name.clone();
        if entry.columns.is_empty() {
            return Err(ConfigError::NoColumns(dataset));
        }
        if !entry.delimiter.is_ascii() {
            return Err(ConfigError::Format {
                dataset,
                reason: format!("delimiter {:?} is not a single ASCII byte", entry.delimiter),
            });
        }
        if entry.decimal != '.' && entry.decimal != ',' {
            return Err(ConfigError::Format {
                dataset,
                reason: format!("decimal separator must be '.' or ',', got {:?}", entry.decimal),
            });
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(entry.columns.len());
        for col in entry.columns {
            if !seen.insert(col.name.clone()) {
                return Err(ConfigError::DuplicateColumn {
                    dataset,
                    column: col.name,
                });
            }
            columns.push(compile_column(&dataset, col)?);
        }

        let mut temporal = Vec::with_capacity(entry.temporal.len());
        for t in entry.temporal {
            temporal.push(match t {
                TemporalEntry::Year { column } => TemporalFilter {
                    column,
                    kind: TemporalKind::Year,
                },
                TemporalEntry::Date { column, format } => {
                    if StrftimeItems::new(&format).any(|i| matches!(i, Item::Error)) {
                        return Err(ConfigError::Column {
                            dataset,
                            column,
                            reason: format!("invalid date format {:?}", format),
                        });
                    }
                    TemporalFilter {
                        column,
                        kind: TemporalKind::Date(format),
                    }
                }
            });
        }

        Ok(Self {
            table: entry.table.unwrap_or_else(|| entry.name.clone()),
            name: entry.name,
            source: entry.source,
            archive_member: entry.archive_member,
            delimiter: entry.delimiter as u8,
            decimal: entry.decimal,
            sentinels: entry.sentinels,
            temporal,
            cutoff_year: entry.cutoff_year,
            columns,
            write_mode: entry.write_mode,
        })
    }

    /// Name of the file this dataset is cached under in the data directory.
    pub fn file_name(&self) -> String {
        match &self.source {
            SourceEntry::Kaggle { file, .. } => file.clone(),
            SourceEntry::Http { url } => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.csv", self.name)),
        }
    }
}

fn compile_column(dataset: &str, col: ColumnEntry) -> Result<ColumnSpec, ConfigError> {
    let mut predicates = Vec::with_capacity(col.predicates.len());
    for p in &col.predicates {
        let compiled = Predicate::compile(p).map_err(|source| ConfigError::Pattern {
            dataset: dataset.to_string(),
            column: col.name.clone(),
            source,
        })?;
        if compiled.is_numeric() && !col.ty.is_numeric() {
            return Err(ConfigError::Column {
                dataset: dataset.to_string(),
                column: col.name,
                reason: "numeric predicate on a text column".into(),
            });
        }
        predicates.push(compiled);
    }
    if col.transform.is_some() && col.ty != ColumnType::Float {
        return Err(ConfigError::Column {
            dataset: dataset.to_string(),
            column: col.name,
            reason: "transforms apply to float columns only".into(),
        });
    }
    Ok(ColumnSpec {
        source: col.source.unwrap_or_else(|| col.name.clone()),
        name: col.name,
        ty: col.ty,
        predicates,
        transform: col.transform,
    })
}

impl PipelineConfig {
    /// Load and validate a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_yaml(&text, &path.display().to_string())?;
        info!(datasets = cfg.datasets.len(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: PipelineFile = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;

        let mut names = HashSet::new();
        let mut datasets = Vec::with_capacity(file.datasets.len());
        for entry in file.datasets {
            if !names.insert(entry.name.clone()) {
                return Err(ConfigError::DuplicateDataset(entry.name));
            }
            let spec = DatasetSpec::from_entry(entry)?;
            debug!(dataset = %spec.name, columns = spec.columns.len(), "validated dataset");
            datasets.push(spec);
        }

        Ok(Self {
            data_dir: file.data_dir,
            database: file.database,
            plots_dir: file.plots_dir,
            datasets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const SAMPLE: &str = r#"
data_dir: scratch
datasets:
  - name: trainstops
    source:
      kind: http
      url: https://download-data.deutschebahn.com/static/datasets/haltestellen/D_Bahnhof_2020_alle.CSV
    delimiter: ";"
    decimal: ","
    columns:
      - name: Verkehr
        type: text
        predicates:
          - kind: one_of
            values: [FV, RV, nur DPN]
      - name: Laenge
        type: float
        predicates:
          - kind: range
            min: -90
            max: 90
      - name: IFOPT
        type: text
        predicates:
          - kind: pattern
            regex: '^[A-Za-z]{2}:\d+:\d+(:\d+)?$'
  - name: temperatures
    source:
      kind: kaggle
      owner: someone
      dataset: sensors
      file: data.csv
    archive_member: data.csv
    temporal:
      - kind: date
        column: Datum
    columns:
      - name: Temperatur
        source: "Temperatur in °C (DWD)"
        type: float
        transform: celsius_to_fahrenheit
    write_mode: append
"#;

    #[test]
    fn loads_and_validates_sample() -> Result<()> {
        let cfg = PipelineConfig::from_yaml(SAMPLE, "inline")?;
        assert_eq!(cfg.data_dir, PathBuf::from("scratch"));
        assert_eq!(cfg.database, PathBuf::from("data/data.sqlite"));
        assert_eq!(cfg.datasets.len(), 2);

        let stops = &cfg.datasets[0];
        assert_eq!(stops.delimiter, b';');
        assert_eq!(stops.decimal, ',');
        assert_eq!(stops.table, "trainstops");
        assert_eq!(stops.file_name(), "D_Bahnhof_2020_alle.CSV");
        assert_eq!(stops.columns[2].predicates.len(), 1);

        let temps = &cfg.datasets[1];
        assert_eq!(temps.write_mode, WriteMode::Append);
        assert_eq!(temps.file_name(), "data.csv");
        assert_eq!(temps.columns[0].source, "Temperatur in °C (DWD)");
        assert_eq!(temps.columns[0].transform, Some(Transform::CelsiusToFahrenheit));
        assert_eq!(
            temps.temporal[0].kind,
            TemporalKind::Date("%Y-%m-%d".into())
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_pattern() {
        let yaml = r#"
datasets:
  - name: broken
    source: { kind: http, url: "http://localhost/x.csv" }
    columns:
      - name: code
        type: text
        predicates:
          - kind: pattern
            regex: "([unclosed"
"#;
        let err = PipelineConfig::from_yaml(yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { ref column, .. } if column == "code"));
    }

    #[test]
    fn rejects_duplicate_columns_and_datasets() {
        let dup_col = r#"
datasets:
  - name: a
    source: { kind: http, url: "http://localhost/a.csv" }
    columns:
      - { name: x, type: integer }
      - { name: x, type: float }
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(dup_col, "inline"),
            Err(ConfigError::DuplicateColumn { .. })
        ));

        let dup_ds = r#"
datasets:
  - name: a
    source: { kind: http, url: "http://localhost/a.csv" }
    columns: [{ name: x, type: integer }]
  - name: a
    source: { kind: http, url: "http://localhost/b.csv" }
    columns: [{ name: y, type: integer }]
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(dup_ds, "inline"),
            Err(ConfigError::DuplicateDataset(ref n)) if n == "a"
        ));
    }

    #[test]
    fn rejects_type_mismatches() {
        let numeric_on_text = r#"
datasets:
  - name: a
    source: { kind: http, url: "http://localhost/a.csv" }
    columns:
      - name: label
        type: text
        predicates: [{ kind: positive }]
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(numeric_on_text, "inline"),
            Err(ConfigError::Column { .. })
        ));

        let transform_on_int = r#"
datasets:
  - name: a
    source: { kind: http, url: "http://localhost/a.csv" }
    columns:
      - { name: t, type: integer, transform: celsius_to_fahrenheit }
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(transform_on_int, "inline"),
            Err(ConfigError::Column { .. })
        ));

        let no_columns = r#"
datasets:
  - name: empty
    source: { kind: http, url: "http://localhost/a.csv" }
    columns: []
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(no_columns, "inline"),
            Err(ConfigError::NoColumns(_))
        ));
    }

    #[test]
    fn shipped_config_is_valid() -> Result<()> {
        let cfg = PipelineConfig::from_yaml(include_str!("../../datasets.yaml"), "datasets.yaml")?;
        assert_eq!(cfg.database, PathBuf::from("data/data.sqlite"));
        let trainstops = &cfg.datasets[0];
        assert_eq!(trainstops.delimiter, b';');
        assert_eq!(trainstops.decimal, ',');
        assert!(trainstops.columns.iter().all(|c| c.name != "Status"));
        let temps = cfg
            .datasets
            .iter()
            .find(|d| d.name == "temperatures")
            .expect("temperatures dataset");
        assert_eq!(temps.file_name(), "mowesta-dataset-20221107.zip");
        assert!(temps.columns.iter().any(|c| c.source == "Temperatur in °C (DWD)"));
        Ok(())
    }
}
