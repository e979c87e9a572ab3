//! Error taxonomy for opening and operating a [`crate::facade::Context`].

#[derive(Debug, thiserror::Error)]
pub enum CtxError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to start file watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Query(#[from] ctx_sql::SqlExecutionError),
}
