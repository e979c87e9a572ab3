//! The capability record through which the core depends on a language
//! without containing any language-specific code itself.

use std::path::Path;

/// Error returned by [`LanguageBinding::produce_scip_for_file`] when the
/// upstream SCIP producer fails for one file. Contained per file by the
/// indexer; never aborts the rest of the batch.
#[derive(Debug, thiserror::Error)]
#[error("failed to produce SCIP for {path}: {message}")]
pub struct ScipProductionError {
    pub path: String,
    pub message: String,
}

/// Everything the indexing pipeline needs to know about one language, without
/// the core depending on how that language is parsed or indexed.
pub trait LanguageBinding: Send + Sync {
    /// Stable identifier, e.g. `"dart"`, `"rust"`, `"python"`.
    fn language_id(&self) -> &str;

    /// File extensions (without the leading dot) this binding claims.
    fn extensions(&self) -> &[&str];

    /// The marker filename that identifies a package root for this language,
    /// e.g. `"pubspec.yaml"`, `"Cargo.toml"`, `"package.json"`.
    fn package_marker(&self) -> &str;

    /// Produce SCIP bytes for one file. Implementations may shell out to an
    /// external indexer process or call a library; the core only ever sees
    /// the resulting bytes, decoded via [`ctx_core::model::documents_from_scip_index`].
    fn produce_scip_for_file(&self, file: &Path) -> Result<Vec<u8>, ScipProductionError>;
}
