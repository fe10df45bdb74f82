// src/store/mod.rs

use anyhow::{Context, Result};
use rusqlite::{params_from_iter, types::Value, Connection};
use std::{fs, path::Path};
use tracing::{debug, info, instrument};

use crate::config::WriteMode;
use crate::table::{CellValue, CleanTable};

/// Handle on the SQLite file holding the cleaned tables.
pub struct TableStore {
    conn: Connection,
}

/// Rows returned by a read-back query. Cells may be NULL here.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl QueryResult {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Quote an SQL identifier.
fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(v: &CellValue) -> Value {
    match v {
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sql_value(v: Value) -> Option<CellValue> {
    match v {
        Value::Null => None,
        Value::Integer(i) => Some(CellValue::Integer(i)),
        Value::Real(f) => Some(CellValue::Float(f)),
        Value::Text(s) => Some(CellValue::Text(s)),
        Value::Blob(b) => Some(CellValue::Text(String::from_utf8_lossy(&b).into_owned())),
    }
}

impl TableStore {
    /// Open (or create) the database file at `path`, creating parent dirs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening SQLite store {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Write `table` into `name` inside one transaction.
    ///
    /// `Replace` drops any existing table first; `Append` creates the table
    /// only if it is absent. Column types are declared from the table's
    /// column definitions. Returns the number of rows inserted.
    #[instrument(level = "info", skip(self, table), fields(rows = table.len()))]
    pub fn write_table(&mut self, name: &str, table: &CleanTable, mode: WriteMode) -> Result<usize> {
        let tx = self.conn.transaction().context("starting transaction")?;

        let table_ident = ident(name);
        let column_defs = table
            .columns
            .iter()
            .map(|c| format!("{} {}", ident(&c.name), c.ty.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");

        if mode == WriteMode::Replace {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", table_ident), [])
                .with_context(|| format!("dropping table {}", name))?;
        }
        tx.execute(
            &format!("CREATE TABLE IF NOT EXISTS {} ({})", table_ident, column_defs),
            [],
        )
        .with_context(|| format!("creating table {}", name))?;

        {
            let names = table
                .columns
                .iter()
                .map(|c| ident(&c.name))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=table.columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table_ident, names, placeholders
                ))
                .with_context(|| format!("preparing insert into {}", name))?;
            for (idx, row) in table.rows.iter().enumerate() {
                stmt.execute(params_from_iter(row.iter().map(to_sql_value)))
                    .with_context(|| format!("inserting row {} into {}", idx, name))?;
            }
        }

        tx.commit().context("committing transaction")?;
        info!(table = name, ?mode, rows = table.len(), "stored table");
        Ok(table.len())
    }

    /// Run a read-only query and collect every row.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("preparing query: {}", sql))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i).map(from_sql_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("running query: {}", sql))?;

        debug!(rows = rows.len(), "query done");
        Ok(QueryResult { columns, rows })
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn row_count(&self, name: &str) -> Result<i64> {
        let n = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", ident(name)), [], |r| {
                r.get(0)
            })
            .with_context(|| format!("counting rows of {}", name))?;
        Ok(n)
    }

    /// Declared column types of `name`, in table order.
    pub fn column_types(&self, name: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", ident(name)))?;
        let cols = stmt
            .query_map([], |r| Ok((r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cols)
    }
}
