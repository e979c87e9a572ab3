//! Error taxonomy for the core crate. Each variant maps one-for-one onto a
//! kind from the system's error design: configuration, cache, and indexing
//! failures never panic and never silently lose data.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache contents: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("document {path} references an invariant violation: {message}")]
    InvariantViolation { path: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cache directory {path} is not writable: {source}")]
    CacheDirUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no language binding registered for marker file(s) found under {path}")]
    NoBindingForPackage { path: PathBuf },
}

impl From<CacheError> for std::io::Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Io { source, .. } => source,
            CacheError::Serialize(e) => std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }
    }
}
