//! Aggregates local and external `ScipIndex` instances behind one
//! cross-index lookup surface.
//!
//! Local indexers are owned by the registry; external indexes (sdk,
//! framework, hosted, git) are shared, read-only, and looked up in a stable
//! fallback order after every local package.

use std::sync::Arc;

use ctx_core::model::{OccurrenceInfo, SymbolInfo};
use ctx_core::ScipIndex;

use crate::indexer::Indexer;

/// Where an externally-attached index came from, mirroring the cache layout
/// under `$HOME/.ctx/{sdk,framework,hosted,git}/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExternalOrigin {
    Sdk,
    Framework,
    Hosted,
    Git,
}

impl ExternalOrigin {
    /// Stable lookup order: sdk, framework, hosted, git.
    fn rank(self) -> u8 {
        match self {
            ExternalOrigin::Sdk => 0,
            ExternalOrigin::Framework => 1,
            ExternalOrigin::Hosted => 2,
            ExternalOrigin::Git => 3,
        }
    }
}

struct ExternalEntry {
    origin: ExternalOrigin,
    tag: String,
    index: Arc<ScipIndex>,
}

/// A reference or definition tagged with the root it was resolved against,
/// so a caller can turn the occurrence's file path into an absolute path.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub source_root: String,
    pub value: T,
}

/// Owns local package indexers; holds shared, read-only external indexes.
/// Created by `open`, destroyed by `dispose` — all owned resources close
/// deterministically when the registry is dropped.
pub struct Registry {
    root_path: String,
    /// Path-sorted at construction time (see `ctx_index::discover_packages`);
    /// this is also the local lookup order for `get_symbol`/`find_definition`.
    local: Vec<Arc<Indexer>>,
    external: Vec<ExternalEntry>,
}

impl Registry {
    pub fn new(root_path: impl Into<String>, local: Vec<Arc<Indexer>>) -> Self {
        Registry {
            root_path: root_path.into(),
            local,
            external: Vec::new(),
        }
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn local_packages(&self) -> &[Arc<Indexer>] {
        &self.local
    }

    /// Attach a read-only external index, e.g. loaded from
    /// `$HOME/.ctx/sdk/<version>/`. `tag` identifies the specific package
    /// within its origin (SDK version, framework package name, repo@commit).
    pub fn attach_external(&mut self, origin: ExternalOrigin, tag: impl Into<String>, index: Arc<ScipIndex>) {
        self.external.push(ExternalEntry {
            origin,
            tag: tag.into(),
            index,
        });
        self.external.sort_by_key(|e| (e.origin.rank(), e.tag.clone()));
    }

    pub fn external_origins(&self) -> Vec<(ExternalOrigin, &str)> {
        self.external.iter().map(|e| (e.origin, e.tag.as_str())).collect()
    }

    /// Read-only access to attached external indexes, for the SQL projection
    /// which needs to materialize every index (local and external) rather
    /// than go through the lookup-by-symbol surface above.
    pub fn external_indexes_for_projection(&self) -> Vec<(String, Arc<ScipIndex>)> {
        self.external
            .iter()
            .map(|e| (e.tag.clone(), e.index.clone()))
            .collect()
    }

    fn all_indexes(&self) -> Vec<(String, Arc<ScipIndex>)> {
        let mut out: Vec<(String, Arc<ScipIndex>)> = self
            .local
            .iter()
            .map(|ix| (ix.root().to_string_lossy().into_owned(), ix.index()))
            .collect();
        out.extend(
            self.external
                .iter()
                .map(|e| (e.tag.clone(), e.index.clone())),
        );
        out
    }

    /// Probe local packages in discovery order, then external indexes in
    /// `sdk, framework, hosted, git` order. Returns the first match.
    pub fn get_symbol(&self, id: &str) -> Option<SymbolInfo> {
        for ix in &self.local {
            if let Some(sym) = ix.index().get_symbol(id) {
                return Some(sym);
            }
        }
        for e in &self.external {
            if let Some(sym) = e.index.get_symbol(id) {
                return Some(sym);
            }
        }
        None
    }

    /// Same fallback order as `get_symbol`; local definitions always win
    /// over external ones because locals are probed first.
    pub fn find_definition(&self, id: &str) -> Option<Located<OccurrenceInfo>> {
        for ix in &self.local {
            if let Some(occ) = ix.index().find_definition(id) {
                return Some(Located {
                    source_root: ix.root().to_string_lossy().into_owned(),
                    value: occ,
                });
            }
        }
        for e in &self.external {
            if let Some(occ) = e.index.find_definition(id) {
                return Some(Located {
                    source_root: e.tag.clone(),
                    value: occ,
                });
            }
        }
        None
    }

    /// Union across every attached index, tagged with each source root.
    pub fn find_all_references(&self, id: &str) -> Vec<Located<OccurrenceInfo>> {
        let mut out = Vec::new();
        for (root, index) in self.all_indexes() {
            for occ in index.find_references(id) {
                out.push(Located {
                    source_root: root.clone(),
                    value: occ,
                });
            }
        }
        out
    }

    /// Union across every attached index, de-duplicated by symbol ID.
    pub fn find_symbols(&self, pattern: &str) -> Vec<SymbolInfo> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (_, index) in self.all_indexes() {
            for sym in index.find_symbols(pattern) {
                if seen.insert(sym.symbol.clone()) {
                    out.push(sym);
                }
            }
        }
        out
    }

    /// Resolve `name` to symbol IDs in every attached index, then aggregate
    /// callers of each resolved ID across every index.
    pub fn find_all_callers_by_name(&self, name: &str) -> Vec<Located<OccurrenceInfo>> {
        let mut out = Vec::new();
        for (root, index) in self.all_indexes() {
            let ids: Vec<String> = index
                .find_symbols(name)
                .into_iter()
                .filter(|s| s.name == name)
                .map(|s| s.symbol)
                .collect();
            for id in ids {
                for caller_id in index.callers_of(&id) {
                    if let Some(occ) = index.find_definition(&caller_id) {
                        out.push(Located {
                            source_root: root.clone(),
                            value: occ,
                        });
                    }
                }
            }
        }
        out
    }

    /// Resolve `name` (optionally filtered by `kind`) to symbol IDs in every
    /// attached index, then aggregate references across every index.
    pub fn find_all_references_by_name(
        &self,
        name: &str,
        kind: Option<ctx_core::model::SymbolKind>,
    ) -> Vec<Located<OccurrenceInfo>> {
        let mut out = Vec::new();
        for (_, index) in self.all_indexes() {
            let ids: Vec<String> = index
                .find_symbols(name)
                .into_iter()
                .filter(|s| s.name == name)
                .filter(|s| kind.map(|k| k.as_str() == s.kind.as_str()).unwrap_or(true))
                .map(|s| s.symbol)
                .collect();
            for id in ids {
                out.extend(self.find_all_references(&id));
            }
        }
        out
    }

    pub fn stats(&self) -> RegistryStats {
        let mut files = 0;
        let mut symbols = 0;
        let mut occurrences = 0;
        for ix in &self.local {
            let s = ix.index().stats();
            files += s.files;
            symbols += s.symbols;
            occurrences += s.occurrences;
        }
        RegistryStats {
            packages: self.local.len(),
            files,
            symbols,
            occurrences,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub packages: usize,
    pub files: usize,
    pub symbols: usize,
    pub occurrences: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use ctx_core::model::{Document, OccurrenceInfo, Range, SymbolInfo, SymbolKind};

    fn sym(id: &str, name: &str) -> SymbolInfo {
        SymbolInfo {
            symbol: id.to_owned(),
            name: name.to_owned(),
            kind: SymbolKind::Class,
            display_name: None,
            documentation: vec![],
            file: Some("lib/a.dart".to_owned()),
            language: Some("dart".to_owned()),
            relationships: vec![],
        }
    }

    fn occ(symbol: &str, file: &str, line: i32, is_def: bool) -> OccurrenceInfo {
        OccurrenceInfo {
            symbol: symbol.to_owned(),
            file: file.to_owned(),
            range: Range {
                start_line: line,
                start_column: 0,
                end_line: line,
                end_column: 5,
            },
            is_definition: is_def,
            enclosing_end_line: None,
        }
    }

    /// S6: a symbol defined in one local package and referenced in another
    /// resolves, by name, to a definition in the defining package and a
    /// reference in the importing one.
    #[test]
    fn find_all_references_by_name_spans_local_packages() {
        let greeter_id = "scip-dart pub pkg_a 1.0.0 lib/greeter.dart/Greeter#";

        let pkg_a_index = ScipIndex::new();
        let mut def_doc = Document::new("lib/greeter.dart");
        def_doc.symbols.push(sym(greeter_id, "Greeter"));
        def_doc
            .occurrences
            .push(occ(greeter_id, "lib/greeter.dart", 0, true));
        pkg_a_index.update_document(def_doc).unwrap();
        let pkg_a = Indexer::from_index(
            PathBuf::from("/root/pkg_a"),
            "pkg_a".to_owned(),
            Arc::new(pkg_a_index),
        );

        let pkg_b_index = ScipIndex::new();
        let mut ref_doc = Document::new("lib/main.dart");
        ref_doc
            .occurrences
            .push(occ(greeter_id, "lib/main.dart", 3, false));
        pkg_b_index.update_document(ref_doc).unwrap();
        let pkg_b = Indexer::from_index(
            PathBuf::from("/root/pkg_b"),
            "pkg_b".to_owned(),
            Arc::new(pkg_b_index),
        );

        let registry = Registry::new("/root", vec![Arc::new(pkg_a), Arc::new(pkg_b)]);

        let located = registry.find_all_references_by_name("Greeter", None);
        assert!(located
            .iter()
            .any(|r| r.value.file == "lib/main.dart" && !r.value.is_definition));

        let def = registry.find_definition(greeter_id).expect("definition found");
        assert_eq!(def.value.file, "lib/greeter.dart");
    }

    #[test]
    fn get_symbol_prefers_local_over_external() {
        let id = "scip-dart pub pkg 1.0.0 lib/a.dart/Greeter#";
        let local_index = ScipIndex::new();
        let mut doc = Document::new("lib/a.dart");
        doc.symbols.push(sym(id, "Greeter"));
        local_index.update_document(doc).unwrap();
        let local = Indexer::from_index(PathBuf::from("/root/pkg"), "pkg".to_owned(), Arc::new(local_index));

        let mut registry = Registry::new("/root", vec![Arc::new(local)]);

        let external_index = ScipIndex::new();
        let mut ext_doc = Document::new("lib/a.dart");
        let mut external_sym = sym(id, "Greeter");
        external_sym.file = None;
        ext_doc.symbols.push(external_sym);
        external_index.update_document(ext_doc).unwrap();
        registry.attach_external(ExternalOrigin::Sdk, "sdk-1.0", Arc::new(external_index));

        let resolved = registry.get_symbol(id).unwrap();
        assert_eq!(resolved.file.as_deref(), Some("lib/a.dart"));
    }
}
