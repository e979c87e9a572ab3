//! Markdown-table and JSON renderings of a [`QueryResult`], per §4.H.

use crate::executor::{QueryResult, SqlValue};

const MAX_TABLE_WIDTH: usize = 120;
const MAX_TABLE_ROWS_FOR_VERTICAL_SWITCH: usize = 20;

/// Render as a Markdown table, switching to a vertical "one row per block"
/// layout when the combined column widths exceed 120 characters and the
/// row count is small enough for that to stay readable (≤20 rows).
pub fn to_markdown(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "(0 rows)\n".to_owned();
    }

    let widths: Vec<usize> = result
        .columns
        .iter()
        .map(|c| {
            let header_width = c.len();
            let cell_width = result
                .rows
                .iter()
                .map(|r| r.get(c).map(|v| v.to_display_string().len()).unwrap_or(0))
                .max()
                .unwrap_or(0);
            header_width.max(cell_width)
        })
        .collect();
    let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3;

    if total_width > MAX_TABLE_WIDTH && result.rows.len() <= MAX_TABLE_ROWS_FOR_VERTICAL_SWITCH {
        return to_vertical(result);
    }

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&result.columns.join(" | "));
    out.push_str(" |\n|");
    for _ in &result.columns {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &result.rows {
        out.push_str("| ");
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_display_string()).unwrap_or_default())
            .collect();
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }
    if result.truncated {
        out.push_str(&format!(
            "\n_truncated: showing {} of {} rows_\n",
            result.rows.len(),
            result.total_rows
        ));
    }
    out
}

fn to_vertical(result: &QueryResult) -> String {
    let mut out = String::new();
    for (i, row) in result.rows.iter().enumerate() {
        out.push_str(&format!("-- row {} --\n", i + 1));
        for col in &result.columns {
            let value = row.get(col).map(|v| v.to_display_string()).unwrap_or_default();
            out.push_str(&format!("{col}: {value}\n"));
        }
        out.push('\n');
    }
    if result.truncated {
        out.push_str(&format!(
            "truncated: showing {} of {} rows\n",
            result.rows.len(),
            result.total_rows
        ));
    }
    out
}

pub fn to_json(result: &QueryResult) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = result
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for col in &result.columns {
                let v = row.get(col).cloned().unwrap_or(SqlValue::Null);
                obj.insert(col.clone(), sql_value_to_json(&v));
            }
            serde_json::Value::Object(obj)
        })
        .collect();

    serde_json::json!({
        "columns": result.columns,
        "rows": rows,
        "total_rows": result.total_rows,
        "truncated": result.truncated,
        "query_time_ms": result.query_time_ms,
    })
}

fn sql_value_to_json(v: &SqlValue) -> serde_json::Value {
    match v {
        SqlValue::Integer(i) => serde_json::json!(i),
        SqlValue::Real(r) => serde_json::json!(r),
        SqlValue::Text(t) => serde_json::json!(t),
        SqlValue::Blob(b) => serde_json::json!(format!("<blob {} bytes>", b.len())),
        SqlValue::Null => serde_json::Value::Null,
    }
}
