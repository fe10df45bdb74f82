// src/clean/mod.rs
//! Row cleaner: reduce a [`RawTable`] to a [`CleanTable`] per a
//! [`DatasetSpec`].
//!
//! Rows are dropped, never reported, when a temporal rule, a sentinel, a
//! predicate or a cast fails. Only a declared column that is absent from the
//! header is an error.

pub mod predicate;

use tracing::{debug, instrument};

use crate::config::{ColumnSpec, DatasetSpec, TemporalFilter, TemporalKind, Transform};
use crate::error::CleanError;
use crate::process::date_parser::{parse_date_year, parse_year};
use crate::process::utils::{is_sentinel, parse_integer, parse_number};
use crate::table::{CellValue, CleanTable, ColumnDef, ColumnType, RawTable};

/// Why a row was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Temporal,
    Missing,
    Predicate,
    Cast,
}

/// Row counts of one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped_temporal: usize,
    pub dropped_missing: usize,
    pub dropped_predicate: usize,
    pub dropped_cast: usize,
}

impl CleanReport {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::Temporal => self.dropped_temporal += 1,
            DropReason::Missing => self.dropped_missing += 1,
            DropReason::Predicate => self.dropped_predicate += 1,
            DropReason::Cast => self.dropped_cast += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped_temporal + self.dropped_missing + self.dropped_predicate + self.dropped_cast
    }
}

/// Clean `raw` according to `spec`.
pub fn clean_table(raw: &RawTable, spec: &DatasetSpec) -> Result<CleanTable, CleanError> {
    clean_table_with_report(raw, spec).map(|(table, _)| table)
}

/// Like [`clean_table`], also returning per-reason drop counts.
#[instrument(level = "debug", skip_all, fields(dataset = %spec.name, rows = raw.len()))]
pub fn clean_table_with_report(
    raw: &RawTable,
    spec: &DatasetSpec,
) -> Result<(CleanTable, CleanReport), CleanError> {
    let column_idx = spec
        .columns
        .iter()
        .map(|c| require_column(raw, spec, &c.source))
        .collect::<Result<Vec<_>, _>>()?;
    let temporal_idx = spec
        .temporal
        .iter()
        .map(|t| require_column(raw, spec, &t.column).map(|i| (i, t)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = CleanReport {
        rows_in: raw.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(raw.len());

    for row in &raw.rows {
        let outcome = check_temporal(row, &temporal_idx, spec.cutoff_year)
            .and_then(|()| clean_row(row, &column_idx, spec));
        match outcome {
            Ok(cells) => rows.push(cells),
            Err(reason) => report.record(reason),
        }
    }
    report.rows_out = rows.len();
    debug!(?report, "cleaned");

    let columns = spec
        .columns
        .iter()
        .map(|c| ColumnDef {
            name: c.name.clone(),
            ty: c.ty,
        })
        .collect();
    Ok((CleanTable { columns, rows }, report))
}

fn require_column(raw: &RawTable, spec: &DatasetSpec, name: &str) -> Result<usize, CleanError> {
    raw.column_index(name)
        .ok_or_else(|| CleanError::MissingColumn {
            dataset: spec.name.clone(),
            column: name.to_string(),
        })
}

fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(String::as_str)
}

/// Every temporal rule must yield a year after `cutoff`. Unreadable years
/// fail the rule.
fn check_temporal(
    row: &[String],
    rules: &[(usize, &TemporalFilter)],
    cutoff: i32,
) -> Result<(), DropReason> {
    for (idx, rule) in rules {
        let raw = cell(row, *idx).unwrap_or("");
        let year = match &rule.kind {
            TemporalKind::Year => parse_year(raw),
            TemporalKind::Date(format) => parse_date_year(raw, format),
        };
        match year {
            Some(y) if y > cutoff => {}
            _ => return Err(DropReason::Temporal),
        }
    }
    Ok(())
}

/// Validate, then cast. All columns are checked before any is cast.
fn clean_row(
    row: &[String],
    column_idx: &[usize],
    spec: &DatasetSpec,
) -> Result<Vec<CellValue>, DropReason> {
    let mut present = Vec::with_capacity(column_idx.len());
    for (col, &idx) in spec.columns.iter().zip(column_idx) {
        let text = match cell(row, idx) {
            Some(v) if !is_sentinel(v, &spec.sentinels) => v.trim(),
            _ => return Err(DropReason::Missing),
        };
        if !col.predicates.is_empty() {
            let number = if col.ty.is_numeric() {
                parse_number(text, spec.decimal)
            } else {
                None
            };
            if !col.predicates.iter().all(|p| p.holds(text, number)) {
                return Err(DropReason::Predicate);
            }
        }
        present.push(text);
    }

    spec.columns
        .iter()
        .zip(present)
        .map(|(col, text)| cast(col, text, spec.decimal).ok_or(DropReason::Cast))
        .collect()
}

fn cast(col: &ColumnSpec, text: &str, decimal: char) -> Option<CellValue> {
    let value = match col.ty {
        ColumnType::Integer => CellValue::Integer(parse_integer(text, decimal)?),
        ColumnType::Float => CellValue::Float(parse_number(text, decimal)?),
        ColumnType::Text => CellValue::Text(text.to_string()),
    };
    Some(match (col.transform, value) {
        (Some(Transform::CelsiusToFahrenheit), CellValue::Float(c)) => {
            CellValue::Float(c * 9.0 / 5.0 + 32.0)
        }
        (_, v) => v,
    })
}
