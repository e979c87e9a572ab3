//! Derives the three public SQL tables (`symbols`, `occurrences`,
//! `relationships`) from every `ScipIndex` attached to a [`ctx_index::Registry`].

use ctx_core::callgraph::synthesize_calls;
use ctx_core::model::{Document, SymbolInfo};
use ctx_core::symbol;
use ctx_index::Registry;
use rusqlite::{params, Connection};

use crate::error::ProjectionError;

/// Bumped whenever the schema in [`create_schema`] changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

pub fn create_schema(conn: &Connection) -> Result<(), ProjectionError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ctx_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS symbols (
            scip_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            file TEXT,
            line INTEGER,
            column_num INTEGER,
            package TEXT,
            version TEXT,
            container_id TEXT,
            display_name TEXT,
            documentation TEXT,
            language TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
        CREATE INDEX IF NOT EXISTS idx_symbols_kind ON symbols(kind);
        CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file);
        CREATE INDEX IF NOT EXISTS idx_symbols_container ON symbols(container_id);

        CREATE TABLE IF NOT EXISTS occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            symbol_id TEXT NOT NULL,
            file TEXT NOT NULL,
            line INTEGER NOT NULL,
            column_num INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            end_column INTEGER NOT NULL,
            is_definition INTEGER NOT NULL CHECK (is_definition IN (0, 1)),
            enclosing_end_line INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_occurrences_symbol ON occurrences(symbol_id);
        CREATE INDEX IF NOT EXISTS idx_occurrences_file ON occurrences(file);
        CREATE INDEX IF NOT EXISTS idx_occurrences_is_definition ON occurrences(is_definition);

        CREATE TABLE IF NOT EXISTS relationships (
            from_symbol TEXT NOT NULL,
            to_symbol TEXT NOT NULL,
            kind TEXT NOT NULL,
            PRIMARY KEY (from_symbol, to_symbol, kind)
        );
        CREATE INDEX IF NOT EXISTS idx_relationships_from ON relationships(from_symbol);
        CREATE INDEX IF NOT EXISTS idx_relationships_to ON relationships(to_symbol);
        CREATE INDEX IF NOT EXISTS idx_relationships_kind ON relationships(kind);
        ",
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO ctx_meta (key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Full rebuild: DELETE every row from the three tables, then re-derive them
/// from every index attached to `registry`. This is the baseline rebuild
/// policy (§4.G); per-file reprojection is a documented future optimization,
/// not implemented here.
pub fn rebuild(conn: &mut Connection, registry: &Registry) -> Result<(), ProjectionError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM symbols", [])?;
    tx.execute("DELETE FROM occurrences", [])?;
    tx.execute("DELETE FROM relationships", [])?;

    for indexer in registry.local_packages() {
        project_index(&tx, &indexer.index())?;
    }
    for (_, index) in external_indexes(registry) {
        project_index(&tx, &index)?;
    }

    tx.commit()?;
    Ok(())
}

fn external_indexes(registry: &Registry) -> Vec<(String, std::sync::Arc<ctx_core::ScipIndex>)> {
    // `Registry` only exposes local packages and lookup methods publicly;
    // external indexes are projected via their tagged origin through the
    // same `all_symbols`/`documents_in_folder` surface as local ones, so we
    // reach them through `find_symbols("")`-style full scans is wasteful.
    // Instead the registry hands back external indexes directly for
    // projection purposes.
    registry.external_indexes_for_projection()
}

fn project_index(tx: &rusqlite::Transaction, index: &ctx_core::ScipIndex) -> Result<(), ProjectionError> {
    for sym in index.all_symbols() {
        insert_symbol(tx, &sym)?;
        for rel in &sym.relationships {
            if rel.is_implementation {
                insert_relationship(tx, &sym.symbol, &rel.target_symbol, "implements")?;
            }
            if rel.is_type_definition {
                insert_relationship(tx, &sym.symbol, &rel.target_symbol, "type_definition")?;
            }
            if rel.is_reference {
                insert_relationship(tx, &sym.symbol, &rel.target_symbol, "references")?;
            }
        }
    }

    for file in index.files() {
        if let Some(doc) = index.document(&file) {
            project_document_occurrences(tx, &doc)?;
            for edge in synthesize_calls(&doc) {
                insert_relationship(tx, &edge.caller, &edge.callee, "calls")?;
            }
        }
    }

    Ok(())
}

fn insert_symbol(tx: &rusqlite::Transaction, sym: &SymbolInfo) -> Result<(), ProjectionError> {
    let parsed = symbol::parse_symbol(&sym.symbol);
    let package = parsed.as_ref().map(|p| p.package_name.clone());
    let version = parsed.as_ref().map(|p| p.version.clone());
    let container_id = symbol::container_id(&sym.symbol);
    let documentation = if sym.documentation.is_empty() {
        None
    } else {
        Some(sym.documentation.join("\n"))
    };

    tx.execute(
        "INSERT OR REPLACE INTO symbols
            (scip_id, name, kind, file, line, column_num, package, version, container_id, display_name, documentation, language)
         VALUES (?1, ?2, ?3, ?4,
            COALESCE((SELECT line FROM symbols WHERE scip_id = ?1), NULL),
            COALESCE((SELECT column_num FROM symbols WHERE scip_id = ?1), NULL),
            ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            sym.symbol,
            sym.name,
            sym.kind.as_str(),
            sym.file,
            package,
            version,
            container_id,
            sym.display_name,
            documentation,
            sym.language,
        ],
    )?;
    Ok(())
}

fn insert_relationship(
    tx: &rusqlite::Transaction,
    from_symbol: &str,
    to_symbol: &str,
    kind: &str,
) -> Result<(), ProjectionError> {
    tx.execute(
        "INSERT OR IGNORE INTO relationships (from_symbol, to_symbol, kind) VALUES (?1, ?2, ?3)",
        params![from_symbol, to_symbol, kind],
    )?;
    Ok(())
}

fn project_document_occurrences(tx: &rusqlite::Transaction, doc: &Document) -> Result<(), ProjectionError> {
    for occ in &doc.occurrences {
        tx.execute(
            "INSERT INTO occurrences
                (symbol_id, file, line, column_num, end_line, end_column, is_definition, enclosing_end_line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                occ.symbol,
                occ.file,
                occ.range.start_line,
                occ.range.start_column,
                occ.range.end_line,
                occ.range.end_column,
                occ.is_definition as i32,
                occ.enclosing_end_line,
            ],
        )?;
        if occ.is_definition {
            tx.execute(
                "UPDATE symbols SET line = ?2, column_num = ?3
                 WHERE scip_id = ?1 AND line IS NULL",
                params![occ.symbol, occ.range.start_line, occ.range.start_column],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctx_core::model::{OccurrenceInfo, Range, SymbolKind};
    use ctx_core::ScipIndex;
    use ctx_index::Indexer;
    use std::sync::Arc;

    fn sym(id: &str, name: &str, kind: SymbolKind) -> SymbolInfo {
        SymbolInfo {
            symbol: id.to_owned(),
            name: name.to_owned(),
            kind,
            display_name: None,
            documentation: vec![],
            file: Some("lib/a.dart".to_owned()),
            language: Some("dart".to_owned()),
            relationships: vec![],
        }
    }

    fn occ(symbol: &str, file: &str, line: i32, is_def: bool, enclosing_end: Option<i32>) -> OccurrenceInfo {
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
            enclosing_end_line: enclosing_end,
        }
    }

    fn registry_with(docs: Vec<Document>) -> Registry {
        let index = ScipIndex::new();
        for doc in docs {
            index.update_document(doc).unwrap();
        }
        let indexer = Indexer::from_index(
            std::path::PathBuf::from("/pkg"),
            "pkg".to_owned(),
            Arc::new(index),
        );
        Registry::new("/root", vec![Arc::new(indexer)])
    }

    #[test]
    fn projects_class_and_reference() {
        let greeter_id = "scip-dart pub pkg 1.0.0 lib/a.dart/Greeter#";
        let hello_id = "scip-dart pub pkg 1.0.0 lib/a.dart/Greeter#hello().";
        let mut a = Document::new("lib/a.dart");
        a.symbols.push(sym(greeter_id, "Greeter", SymbolKind::Class));
        a.symbols.push(sym(hello_id, "hello", SymbolKind::Method));
        a.occurrences.push(occ(greeter_id, "lib/a.dart", 0, true, Some(2)));
        a.occurrences.push(occ(hello_id, "lib/a.dart", 1, true, None));

        let mut b = Document::new("lib/b.dart");
        b.occurrences.push(occ(hello_id, "lib/b.dart", 0, false, None));

        let registry = registry_with(vec![a, b]);
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        rebuild(&mut conn, &registry).unwrap();

        let (name, kind): (String, String) = conn
            .query_row(
                "SELECT name, kind FROM symbols WHERE name = 'Greeter'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!((name.as_str(), kind.as_str()), ("Greeter", "class"));

        let file: String = conn
            .query_row(
                "SELECT o.file FROM occurrences o JOIN symbols s ON o.symbol_id = s.scip_id
                 WHERE s.name = 'hello' AND o.is_definition = 0",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(file, "lib/b.dart");
    }

    #[test]
    fn synthesizes_calls_edge() {
        let outer_id = "scip-dart pub pkg 1.0.0 lib/c.dart/outer().";
        let inner_id = "scip-dart pub pkg 1.0.0 lib/c.dart/inner().";
        let mut doc = Document::new("lib/c.dart");
        doc.symbols.push(sym(outer_id, "outer", SymbolKind::Function));
        doc.symbols.push(sym(inner_id, "inner", SymbolKind::Function));
        doc.occurrences.push(occ(outer_id, "lib/c.dart", 0, true, Some(2)));
        doc.occurrences.push(occ(inner_id, "lib/c.dart", 2, true, None));
        doc.occurrences.push(occ(inner_id, "lib/c.dart", 1, false, None));

        let registry = registry_with(vec![doc]);
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        rebuild(&mut conn, &registry).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM relationships r
                 JOIN symbols s_from ON r.from_symbol = s_from.scip_id
                 JOIN symbols s_to ON r.to_symbol = s_to.scip_id
                 WHERE r.kind = 'calls' AND s_from.name = 'outer' AND s_to.name = 'inner'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn unparsable_symbol_id_still_inserts_with_raw_name() {
        let mut doc = Document::new("lib/x.dart");
        doc.symbols.push(sym("opaque-id#", "opaque-id", SymbolKind::Unspecified));
        let registry = registry_with(vec![doc]);
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        rebuild(&mut conn, &registry).unwrap();

        let (package, version): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT package, version FROM symbols WHERE scip_id = 'opaque-id#'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(package.is_none());
        assert!(version.is_none());
    }
}
