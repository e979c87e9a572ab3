//! SCIP model, in-memory index, cache store, config and errors shared by
//! every other `ctx` crate.
//!
//! - [`model`] — typed SCIP documents, symbols, occurrences
//! - [`index`] — [`index::ScipIndex`], the mutable in-memory index
//! - [`cache`] — durable load/save of an index plus its content-hash manifest
//! - [`symbol`] — SCIP symbol identifier parsing
//! - [`callgraph`] — call-graph synthesis shared by the index and the SQL projection
//! - [`config`] — `ctx.toml` loading
//! - [`error`] — error taxonomy shared by the indexing pipeline

pub mod cache;
pub mod callgraph;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod model;
pub mod symbol;

pub use cache::{Manifest, SCHEMA_VERSION};
pub use config::CtxConfig;
pub use index::{IndexStats, ScipIndex};
pub use model::{Document, OccurrenceInfo, Range, SymbolInfo, SymbolKind, SymbolRelationship};
