// src/table.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows as read from a delimited file, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Each data record, one String per field. Records may be shorter or
    /// longer than `headers`; a missing trailing field reads as absent.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of `name` in the header row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Target primitive type of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Declared SQLite column type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

/// A typed cell of a [`CleanTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            CellValue::Integer(_) => ColumnType::Integer,
            CellValue::Float(_) => ColumnType::Float,
            CellValue::Text(_) => ColumnType::Text,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render back to raw text, writing floats with `decimal` as separator.
    pub fn to_raw(&self, decimal: char) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => {
                let s = f.to_string();
                if decimal == '.' {
                    s
                } else {
                    s.replace('.', &decimal.to_string())
                }
            }
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Name and type of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
}

/// Validated, typed rows. Every cell matches its column's type and no cell
/// is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All values of column `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Turn the table back into raw text rows, e.g. to feed it through the
    /// cleaner again.
    pub fn to_raw(&self, decimal: char) -> RawTable {
        RawTable {
            headers: self.columns.iter().map(|c| c.name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_raw(decimal)).collect())
                .collect(),
        }
    }
}
