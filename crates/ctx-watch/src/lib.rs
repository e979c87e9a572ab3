//! File watching and the `Context` façade that wires discovery, indexing,
//! the registry, and the SQL projection into one open/sql/refresh surface.
//!
//! - [`error`] — [`error::CtxError`], the error taxonomy for opening and
//!   operating a [`facade::Context`].
//! - [`watcher`] — [`watcher::RootWatcher`], per-root debounced routing of
//!   file-system events to the owning package's indexer.
//! - [`facade`] — [`facade::Context`], the public entry point.

pub mod error;
pub mod facade;
pub mod watcher;

pub use error::CtxError;
pub use facade::{Context, ContextStats, OpenOptions};
pub use watcher::RootWatcher;
