//! Error taxonomy for the projection and query subsystems.

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("sqlite error while materializing projection: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Surfaced to `sql()` callers verbatim, per the query-error propagation
/// policy: message plus the original SQL, never a panic.
#[derive(Debug, thiserror::Error)]
#[error("query failed: {message}\n  sql: {sql}")]
pub struct SqlExecutionError {
    pub message: String,
    pub sql: String,
    #[source]
    pub cause: Option<rusqlite::Error>,
}

impl SqlExecutionError {
    pub fn rejected(sql: &str) -> Self {
        let snippet: String = sql.chars().take(50).collect();
        SqlExecutionError {
            message: format!(
                "only SELECT, WITH, and EXPLAIN statements are allowed (got: \"{snippet}\")"
            ),
            sql: sql.to_owned(),
            cause: None,
        }
    }

    pub fn from_sqlite(sql: &str, err: rusqlite::Error) -> Self {
        SqlExecutionError {
            message: err.to_string(),
            sql: sql.to_owned(),
            cause: Some(err),
        }
    }
}
