//! Read-only SELECT pipeline: statement gating, parameter binding, the
//! 10,000-row cap, and formatted results.

use std::collections::BTreeMap;
use std::time::Instant;

use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

use crate::error::SqlExecutionError;

pub const DEFAULT_ROW_CAP: usize = 10_000;

/// A SQLite value reduced to the host language's canonical JSON-ish shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl SqlValue {
    fn from_value_ref(v: ValueRef) -> SqlValue {
        match v {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(r) => SqlValue::Real(r),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }

    pub fn to_display_string(&self) -> String {
        match self {
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(r) => r.to_string(),
            SqlValue::Text(t) => t.clone(),
            SqlValue::Blob(b) => format!("<blob {} bytes>", b.len()),
            SqlValue::Null => "NULL".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, SqlValue>>,
    pub total_rows: usize,
    pub truncated: bool,
    pub query_time_ms: u64,
}

fn first_token_is_allowed(sql: &str) -> bool {
    let trimmed = sql.trim_start();
    let upper: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    matches!(upper.as_str(), "SELECT" | "WITH" | "EXPLAIN")
}

/// Execute one read-only SQL statement with positional parameters.
/// Rejects anything whose first token isn't `SELECT`, `WITH`, or `EXPLAIN`.
/// Caps result rows at `row_cap`, marking `truncated` if more were available.
pub fn execute(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    row_cap: usize,
) -> Result<QueryResult, SqlExecutionError> {
    if !first_token_is_allowed(sql) {
        return Err(SqlExecutionError::rejected(sql));
    }

    let start = Instant::now();
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SqlExecutionError::from_sqlite(sql, e))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let bound: Vec<Value> = params.iter().map(to_rusqlite_value).collect();
    let mut rows_cursor = stmt
        .query(rusqlite::params_from_iter(bound.iter()))
        .map_err(|e| SqlExecutionError::from_sqlite(sql, e))?;

    let mut rows = Vec::new();
    let mut total_rows = 0usize;
    let mut truncated = false;
    loop {
        let row = rows_cursor
            .next()
            .map_err(|e| SqlExecutionError::from_sqlite(sql, e))?;
        let Some(row) = row else { break };
        total_rows += 1;
        if rows.len() < row_cap {
            let mut map = BTreeMap::new();
            for (idx, name) in columns.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| SqlExecutionError::from_sqlite(sql, e))?;
                map.insert(name.clone(), SqlValue::from_value_ref(value));
            }
            rows.push(map);
        } else {
            truncated = true;
        }
    }

    Ok(QueryResult {
        columns,
        rows,
        total_rows,
        truncated,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}

fn to_rusqlite_value(v: &SqlValue) -> Value {
    match v {
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(r) => Value::Real(*r),
        SqlValue::Text(t) => Value::Text(t.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
        SqlValue::Null => Value::Null,
    }
}
