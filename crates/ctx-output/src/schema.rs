//! Renders the SQL schema description shown by `ctx schema`.

use crate::OutputFormat;

const TABLES: &[(&str, &[&str])] = &[
    (
        "symbols",
        &[
            "scip_id", "name", "kind", "file", "line", "column_num", "package", "version",
            "container_id", "display_name", "documentation", "language",
        ],
    ),
    (
        "occurrences",
        &[
            "id", "symbol_id", "file", "line", "column_num", "end_line", "end_column",
            "is_definition", "enclosing_end_line",
        ],
    ),
    ("relationships", &["from_symbol", "to_symbol", "kind"]),
];

const EXAMPLE_QUERIES: &[&str] = &[
    "SELECT * FROM symbols WHERE name = 'Greeter'",
    "SELECT file, line FROM occurrences WHERE symbol_id = ? AND is_definition = 1",
    "SELECT s.name FROM relationships r JOIN symbols s ON r.from_symbol = s.scip_id \
     WHERE r.to_symbol = ? AND r.kind = 'calls'",
];

pub fn format_schema(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for (table, columns) in TABLES {
                out.push_str(&format!("{table}(\n"));
                for col in *columns {
                    out.push_str(&format!("  {col}\n"));
                }
                out.push_str(")\n\n");
            }
            out.push_str("example queries:\n");
            for q in EXAMPLE_QUERIES {
                out.push_str(&format!("  {q}\n"));
            }
            out
        }
        OutputFormat::Json => {
            let tables: serde_json::Value = TABLES
                .iter()
                .map(|(name, cols)| serde_json::json!({ "table": name, "columns": cols }))
                .collect();
            serde_json::to_string_pretty(&serde_json::json!({
                "tables": tables,
                "example_queries": EXAMPLE_QUERIES,
            }))
            .unwrap_or_default()
        }
    }
}
