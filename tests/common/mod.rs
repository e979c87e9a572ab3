//! Shared fixtures for the end-to-end tests: a fake [`LanguageBinding`] that
//! hands back pre-built SCIP protobuf bytes instead of shelling out to a
//! real indexer, plus a small builder for those bytes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ctx_index::{LanguageBinding, ScipProductionError};
use protobuf::{EnumOrUnknown, Message};
use scip::types::{symbol_information::Kind, Document, Index, Occurrence, SymbolInformation, SymbolRole};

/// One symbol's worth of fixture data: its definition range plus any
/// reference ranges and outgoing relationships.
pub struct FixtureSymbol {
    pub id: String,
    pub kind: Kind,
    pub def_range: Option<Vec<i32>>,
    pub enclosing_range: Option<Vec<i32>>,
    pub reference_ranges: Vec<Vec<i32>>,
    pub relationships: Vec<(String, bool, bool, bool)>,
    pub emit_symbol_info: bool,
}

impl FixtureSymbol {
    pub fn new(id: &str, kind: Kind, def_range: [i32; 4]) -> Self {
        FixtureSymbol {
            id: id.to_owned(),
            kind,
            def_range: Some(def_range.to_vec()),
            enclosing_range: None,
            reference_ranges: Vec::new(),
            relationships: Vec::new(),
            emit_symbol_info: true,
        }
    }

    /// A symbol that only occurs as a reference in this document, with no
    /// definition occurrence and no `SymbolInformation` entry (mirrors a
    /// real producer's per-document output when a file only uses a symbol
    /// defined elsewhere).
    pub fn reference_only(id: &str, range: [i32; 4]) -> Self {
        FixtureSymbol {
            id: id.to_owned(),
            kind: Kind::UnspecifiedKind,
            def_range: None,
            enclosing_range: None,
            reference_ranges: vec![range.to_vec()],
            relationships: Vec::new(),
            emit_symbol_info: false,
        }
    }

    pub fn enclosing(mut self, range: [i32; 3]) -> Self {
        self.enclosing_range = Some(range.to_vec());
        self
    }

    pub fn referenced_at(mut self, range: [i32; 4]) -> Self {
        self.reference_ranges.push(range.to_vec());
        self
    }

    pub fn implements(mut self, target: &str) -> Self {
        self.relationships.push((target.to_owned(), true, false, false));
        self
    }
}

/// Serialize one document's worth of fixture symbols into a `scip::types::Index`
/// protobuf, the same bytes a real SCIP producer would hand the indexer.
pub fn build_scip_bytes(relative_path: &str, language: &str, symbols: Vec<FixtureSymbol>) -> Vec<u8> {
    let mut doc = Document::new();
    doc.relative_path = relative_path.to_owned();
    doc.language = language.to_owned();

    for fixture in symbols {
        if fixture.emit_symbol_info {
            let mut sym_info = SymbolInformation::new();
            sym_info.symbol = fixture.id.clone();
            sym_info.kind = EnumOrUnknown::new(fixture.kind);
            for (target, is_impl, is_type_def, is_ref) in &fixture.relationships {
                let mut rel = scip::types::Relationship::new();
                rel.symbol = target.clone();
                rel.is_implementation = *is_impl;
                rel.is_type_definition = *is_type_def;
                rel.is_reference = *is_ref;
                sym_info.relationships.push(rel);
            }
            doc.symbols.push(sym_info);
        }

        if let Some(def_range) = fixture.def_range {
            let mut def_occ = Occurrence::new();
            def_occ.symbol = fixture.id.clone();
            def_occ.range = def_range;
            def_occ.symbol_roles = SymbolRole::Definition as i32;
            if let Some(enclosing) = fixture.enclosing_range {
                def_occ.enclosing_range = enclosing;
            }
            doc.occurrences.push(def_occ);
        }

        for range in fixture.reference_ranges {
            let mut occ = Occurrence::new();
            occ.symbol = fixture.id.clone();
            occ.range = range;
            doc.occurrences.push(occ);
        }
    }

    let mut index = Index::new();
    index.documents.push(doc);
    index.write_to_bytes().expect("fixture index always encodes")
}

/// A [`LanguageBinding`] that serves pre-baked SCIP bytes keyed by relative
/// path instead of invoking a real producer, and discovers under a fixed
/// marker/extension pair so package discovery exercises the real walk.
///
/// Cloning shares the same backing map and root, so a test can keep a handle
/// to mutate registered files after handing a clone into `Context::open`.
#[derive(Clone)]
pub struct FixtureBinding {
    root: PathBuf,
    docs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl FixtureBinding {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FixtureBinding {
            root: root.into(),
            docs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register (or replace) the bytes served for `relative_path`, and touch
    /// the file on disk so discovery and hashing see it.
    pub fn set_file(&self, relative_path: &str, contents: &str, scip_bytes: Vec<u8>) {
        let abs = self.root.join(relative_path);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&abs, contents).unwrap();
        self.docs.lock().unwrap().insert(relative_path.to_owned(), scip_bytes);
    }

    pub fn remove_file(&self, relative_path: &str) {
        let _ = std::fs::remove_file(self.root.join(relative_path));
        self.docs.lock().unwrap().remove(relative_path);
    }
}

impl LanguageBinding for FixtureBinding {
    fn language_id(&self) -> &str {
        "fixture"
    }

    fn extensions(&self) -> &[&str] {
        &["fx"]
    }

    fn package_marker(&self) -> &str {
        "fixture.toml"
    }

    fn produce_scip_for_file(&self, file: &Path) -> Result<Vec<u8>, ScipProductionError> {
        let relative = file
            .strip_prefix(&self.root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");
        self.docs
            .lock()
            .unwrap()
            .get(&relative)
            .cloned()
            .ok_or_else(|| ScipProductionError {
                path: relative.clone(),
                message: "no fixture bytes registered for this path".to_owned(),
            })
    }
}
