//! Mutable, per-package in-memory SCIP index with O(1) lookups.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::IndexError;
use crate::model::{Document, OccurrenceInfo, SymbolInfo};

#[derive(Debug, Default)]
struct IndexInner {
    documents: HashMap<String, Document>,
    symbols_by_id: HashMap<String, SymbolInfo>,
    /// Non-definition occurrences only, keyed by symbol id.
    occurrences_by_symbol: HashMap<String, Vec<OccurrenceInfo>>,
    /// At most one definition per symbol.
    definitions_by_symbol: HashMap<String, OccurrenceInfo>,
    symbols_by_file: HashMap<String, HashSet<String>>,
    /// Lowercase name -> symbol ids sharing that name.
    name_index: HashMap<String, HashSet<String>>,
}

/// Aggregate counters returned by [`ScipIndex::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files: usize,
    pub symbols: usize,
    pub occurrences: usize,
}

/// The in-memory SCIP model for one package. Many readers, one writer at a
/// time; `update_document`/`remove_document` hold the write lock only across
/// the map-swap step so readers never observe a half-replaced document.
#[derive(Debug, Default)]
pub struct ScipIndex {
    inner: RwLock<IndexInner>,
}

impl ScipIndex {
    pub fn new() -> Self {
        ScipIndex::default()
    }

    /// Replace any existing document with the same `relative_path`. Symbols
    /// and occurrences sourced only by the old document are fully retracted
    /// before the new document's contents are inserted.
    pub fn update_document(&self, doc: Document) -> Result<(), IndexError> {
        let mut inner = self.inner.write().expect("ctx-core index lock poisoned");
        if let Some(old) = inner.documents.remove(&doc.relative_path) {
            retract_document(&mut inner, &old);
        }
        insert_document(&mut inner, &doc);
        inner.documents.insert(doc.relative_path.clone(), doc);
        Ok(())
    }

    pub fn remove_document(&self, path: &str) {
        let mut inner = self.inner.write().expect("ctx-core index lock poisoned");
        if let Some(old) = inner.documents.remove(path) {
            retract_document(&mut inner, &old);
        }
    }

    pub fn get_symbol(&self, id: &str) -> Option<SymbolInfo> {
        self.inner.read().unwrap().symbols_by_id.get(id).cloned()
    }

    pub fn find_definition(&self, id: &str) -> Option<OccurrenceInfo> {
        self.inner
            .read()
            .unwrap()
            .definitions_by_symbol
            .get(id)
            .cloned()
    }

    pub fn find_references(&self, id: &str) -> Vec<OccurrenceInfo> {
        self.inner
            .read()
            .unwrap()
            .occurrences_by_symbol
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// `pattern` is a plain case-insensitive substring, a `*`-glob, or a
    /// `/regex/`-delimited regular expression, matched against symbol names.
    pub fn find_symbols(&self, pattern: &str) -> Vec<SymbolInfo> {
        let inner = self.inner.read().unwrap();
        let matcher = NameMatcher::new(pattern);
        let mut out = Vec::new();
        for (name, ids) in inner.name_index.iter() {
            if matcher.matches(name) {
                for id in ids {
                    if let Some(sym) = inner.symbols_by_id.get(id) {
                        out.push(sym.clone());
                    }
                }
            }
        }
        out
    }

    pub fn members_of(&self, container_id: &str) -> Vec<SymbolInfo> {
        let inner = self.inner.read().unwrap();
        inner
            .symbols_by_id
            .values()
            .filter(|s| crate::symbol::container_id(&s.symbol).as_deref() == Some(container_id))
            .cloned()
            .collect()
    }

    pub fn supertypes_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner
            .symbols_by_id
            .get(id)
            .map(|s| {
                s.relationships
                    .iter()
                    .filter(|r| r.is_implementation)
                    .map(|r| r.target_symbol.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn subtypes_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner
            .symbols_by_id
            .values()
            .filter(|s| {
                s.relationships
                    .iter()
                    .any(|r| r.is_implementation && r.target_symbol == id)
            })
            .map(|s| s.symbol.clone())
            .collect()
    }

    /// Symbols called from within `id`'s definition, inferred from enclosing
    /// ranges (see [`crate::callgraph`]). Computed on demand; not one of the
    /// five maintained derived maps.
    pub fn calls_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();
        for doc in inner.documents.values() {
            for edge in crate::callgraph::synthesize_calls(doc) {
                if edge.caller == id {
                    out.push(edge.callee);
                }
            }
        }
        out
    }

    /// Symbols whose definitions contain a reference to `id`.
    pub fn callers_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();
        for doc in inner.documents.values() {
            for edge in crate::callgraph::synthesize_calls(doc) {
                if edge.callee == id {
                    out.push(edge.caller);
                }
            }
        }
        out
    }

    pub fn all_symbols(&self) -> Vec<SymbolInfo> {
        self.inner.read().unwrap().symbols_by_id.values().cloned().collect()
    }

    pub fn files(&self) -> Vec<String> {
        let mut v: Vec<String> = self.inner.read().unwrap().documents.keys().cloned().collect();
        v.sort();
        v
    }

    pub fn document(&self, path: &str) -> Option<Document> {
        self.inner.read().unwrap().documents.get(path).cloned()
    }

    pub fn documents_in_folder(&self, folder: &str) -> Vec<Document> {
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{folder}/")
        };
        self.inner
            .read()
            .unwrap()
            .documents
            .values()
            .filter(|d| d.relative_path.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read().unwrap();
        IndexStats {
            files: inner.documents.len(),
            symbols: inner.symbols_by_id.len(),
            occurrences: inner
                .occurrences_by_symbol
                .values()
                .map(|v| v.len())
                .sum::<usize>()
                + inner.definitions_by_symbol.len(),
        }
    }

    /// All documents, for serialization into the cache store.
    pub fn documents(&self) -> Vec<Document> {
        self.inner.read().unwrap().documents.values().cloned().collect()
    }

    /// Rebuild a fresh index from a flat set of documents (used by cache load).
    pub fn from_documents(docs: Vec<Document>) -> Self {
        let index = ScipIndex::new();
        for doc in docs {
            index.update_document(doc).expect("document invariants hold on load");
        }
        index
    }
}

fn retract_document(inner: &mut IndexInner, doc: &Document) {
    for sym in &doc.symbols {
        inner.symbols_by_id.remove(&sym.symbol);
        if let Some(set) = inner.symbols_by_file.get_mut(&doc.relative_path) {
            set.remove(&sym.symbol);
        }
        if let Some(set) = inner.name_index.get_mut(&sym.name.to_lowercase()) {
            set.remove(&sym.symbol);
        }
    }
    inner.symbols_by_file.remove(&doc.relative_path);
    for occ in &doc.occurrences {
        if occ.is_definition {
            if inner
                .definitions_by_symbol
                .get(&occ.symbol)
                .map(|d| d.file == occ.file)
                .unwrap_or(false)
            {
                inner.definitions_by_symbol.remove(&occ.symbol);
            }
        } else if let Some(v) = inner.occurrences_by_symbol.get_mut(&occ.symbol) {
            v.retain(|o| o.file != occ.file || o.range != occ.range);
        }
    }
}

fn insert_document(inner: &mut IndexInner, doc: &Document) {
    for sym in &doc.symbols {
        inner.symbols_by_id.insert(sym.symbol.clone(), sym.clone());
        inner
            .symbols_by_file
            .entry(doc.relative_path.clone())
            .or_default()
            .insert(sym.symbol.clone());
        inner
            .name_index
            .entry(sym.name.to_lowercase())
            .or_default()
            .insert(sym.symbol.clone());
    }
    for occ in &doc.occurrences {
        if occ.is_definition {
            // Later write wins, matching the invariant that a second
            // definition for the same symbol replaces the first.
            inner.definitions_by_symbol.insert(occ.symbol.clone(), occ.clone());
        } else {
            inner
                .occurrences_by_symbol
                .entry(occ.symbol.clone())
                .or_default()
                .push(occ.clone());
        }
    }
}

enum NameMatcher {
    Substring(String),
    Glob(globset::GlobMatcher),
    Regex(regex_lite::Regex),
}

impl NameMatcher {
    fn new(pattern: &str) -> Self {
        if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
            let body = &pattern[1..pattern.len() - 1];
            if let Ok(re) = regex_lite::Regex::new(body) {
                return NameMatcher::Regex(re);
            }
        }
        if pattern.contains('*') {
            if let Ok(glob) = globset::Glob::new(&pattern.to_lowercase()) {
                return NameMatcher::Glob(glob.compile_matcher());
            }
        }
        NameMatcher::Substring(pattern.to_lowercase())
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Substring(needle) => name.contains(needle.as_str()),
            NameMatcher::Glob(m) => m.is_match(name),
            NameMatcher::Regex(re) => re.is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Range, SymbolKind};

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

    fn doc_with(path: &str, symbol: &str, name: &str) -> Document {
        Document {
            relative_path: path.to_owned(),
            language: Some("dart".to_owned()),
            symbols: vec![sym(symbol, name)],
            occurrences: vec![occ(symbol, path, 1, true)],
        }
    }

    #[test]
    fn update_then_reinsert_is_idempotent() {
        let index = ScipIndex::new();
        let doc = doc_with("lib/a.dart", "sym1", "Greeter");
        index.update_document(doc.clone()).unwrap();
        let before = index.stats();
        index.update_document(doc).unwrap();
        assert_eq!(before, index.stats());
    }

    #[test]
    fn remove_then_reinsert_restores_state() {
        let index = ScipIndex::new();
        let doc = doc_with("lib/a.dart", "sym1", "Greeter");
        index.update_document(doc.clone()).unwrap();
        let before = index.stats();
        index.remove_document("lib/a.dart");
        assert_eq!(index.stats().files, 0);
        index.update_document(doc).unwrap();
        assert_eq!(before, index.stats());
    }

    #[test]
    fn references_never_include_definitions() {
        let index = ScipIndex::new();
        let mut doc = doc_with("lib/a.dart", "sym1", "Greeter");
        doc.occurrences.push(occ("sym1", "lib/a.dart", 5, false));
        index.update_document(doc).unwrap();
        let refs = index.find_references("sym1");
        assert!(refs.iter().all(|o| !o.is_definition));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn find_definition_returns_at_most_one() {
        let index = ScipIndex::new();
        index.update_document(doc_with("lib/a.dart", "sym1", "Greeter")).unwrap();
        assert!(index.find_definition("sym1").is_some());
        assert!(index.find_definition("nope").is_none());
    }

    #[test]
    fn update_document_replaces_old_contributions() {
        let index = ScipIndex::new();
        index.update_document(doc_with("lib/a.dart", "sym1", "Greeter")).unwrap();
        index.update_document(doc_with("lib/a.dart", "sym2", "Farewell")).unwrap();
        assert!(index.get_symbol("sym1").is_none());
        assert!(index.get_symbol("sym2").is_some());
        assert_eq!(index.files(), vec!["lib/a.dart".to_owned()]);
    }

    #[test]
    fn find_symbols_supports_substring_glob_and_regex() {
        let index = ScipIndex::new();
        index.update_document(doc_with("lib/a.dart", "sym1", "Greeter")).unwrap();
        assert_eq!(index.find_symbols("greet").len(), 1);
        assert_eq!(index.find_symbols("Gr*er").len(), 1);
        assert_eq!(index.find_symbols("/^Greet.*/").len(), 1);
        assert_eq!(index.find_symbols("nomatch").len(), 0);
    }
}
