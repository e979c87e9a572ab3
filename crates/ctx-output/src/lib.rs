//! Text and JSON renderers for `ctx` CLI command output.
//!
//! Mirrors the teacher's `OutputFormatter` split (one trait, one
//! implementation per `-f/--format` value) but scoped to what the `ctx`
//! façade actually returns: query results, the schema, aggregate stats, and
//! the discovered package list. Raw SQL result rendering (Markdown table vs.
//! vertical layout, JSON) already lives in [`ctx_sql::format`]; this crate
//! only adds the surrounding command outputs the CLI needs.

pub mod packages;
pub mod schema;
pub mod stats;

pub use packages::format_packages;
pub use schema::format_schema;
pub use stats::format_stats;

/// Selected via `-f/--format`; `Text` is the default for a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}', expected 'text' or 'json'")),
        }
    }
}

/// Render one [`ctx_sql::QueryResult`] per the selected format: Markdown (or
/// vertical layout for wide results) for `Text`, structured JSON for `Json`.
pub fn format_query_result(result: &ctx_sql::QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => ctx_sql::format::to_markdown(result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&ctx_sql::format::to_json(result)).unwrap_or_default()
        }
    }
}
