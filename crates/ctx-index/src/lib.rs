//! Package discovery, per-package indexing, and cross-package registry.
//!
//! - [`binding`] — [`binding::LanguageBinding`], the capability record through
//!   which the core depends on a language without containing any
//!   language-specific code itself.
//! - [`discovery`] — marker-file breadth-first package discovery.
//! - [`indexer`] — [`indexer::Indexer`], the per-package orchestrator.
//! - [`registry`] — [`registry::Registry`], aggregating local and external
//!   `ScipIndex` instances behind one cross-index lookup surface.

pub mod binding;
pub mod discovery;
pub mod indexer;
pub mod registry;

pub use binding::{LanguageBinding, ScipProductionError};
pub use discovery::{discover_packages, DiscoveredPackage};
pub use indexer::{IndexUpdate, Indexer};
pub use registry::{ExternalOrigin, Registry};
