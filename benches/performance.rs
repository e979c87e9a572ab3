use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctx_core::model::{Document, OccurrenceInfo, Range, SymbolInfo, SymbolKind};
use ctx_core::ScipIndex;
use ctx_index::Indexer;
use ctx_sql::executor::{execute, SqlValue};
use ctx_sql::{create_schema, rebuild};
use rusqlite::Connection;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Hashing benchmarks
// ---------------------------------------------------------------------------

fn bench_hash_bytes(c: &mut Criterion) {
    let small = b"class Greeter { void hello() {} }";
    c.bench_function("hash_small_file", |b| {
        b.iter(|| ctx_core::hash::hash_bytes(black_box(small)))
    });

    let large = small.repeat(500);
    c.bench_function("hash_large_file", |b| {
        b.iter(|| ctx_core::hash::hash_bytes(black_box(&large)))
    });
}

// ---------------------------------------------------------------------------
// In-memory index benchmarks
// ---------------------------------------------------------------------------

fn sym(id: &str, name: &str, kind: SymbolKind, file: &str) -> SymbolInfo {
    SymbolInfo {
        symbol: id.to_owned(),
        name: name.to_owned(),
        kind,
        display_name: None,
        documentation: vec![],
        file: Some(file.to_owned()),
        language: Some("fixture".to_owned()),
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

fn document_with_n_symbols(path: &str, n: usize) -> Document {
    let mut doc = Document::new(path);
    for i in 0..n {
        let id = format!("scip-fixture pub pkg 1.0.0 {path}/Sym{i}#");
        doc.symbols.push(sym(&id, &format!("Sym{i}"), SymbolKind::Class, path));
        doc.occurrences.push(occ(&id, path, i as i32, true));
    }
    doc
}

fn bench_index_update_document(c: &mut Criterion) {
    let doc = document_with_n_symbols("lib/a.fx", 200);
    c.bench_function("index_update_document_200_symbols", |b| {
        b.iter(|| {
            let index = ScipIndex::new();
            index.update_document(black_box(doc.clone())).unwrap();
        })
    });
}

fn bench_index_find_symbols(c: &mut Criterion) {
    let index = ScipIndex::new();
    index.update_document(document_with_n_symbols("lib/a.fx", 1000)).unwrap();

    c.bench_function("index_find_symbols_substring_1000", |b| {
        b.iter(|| index.find_symbols(black_box("Sym42")))
    });
}

fn bench_index_get_symbol(c: &mut Criterion) {
    let index = ScipIndex::new();
    index.update_document(document_with_n_symbols("lib/a.fx", 1000)).unwrap();
    let target = "scip-fixture pub pkg 1.0.0 lib/a.fx/Sym500#";

    c.bench_function("index_get_symbol_by_id", |b| {
        b.iter(|| index.get_symbol(black_box(target)))
    });
}

// ---------------------------------------------------------------------------
// SQL projection and query benchmarks
// ---------------------------------------------------------------------------

fn registry_with_n_symbols(n: usize) -> ctx_index::Registry {
    let index = ScipIndex::new();
    index.update_document(document_with_n_symbols("lib/a.fx", n)).unwrap();
    let indexer = Indexer::from_index(
        std::path::PathBuf::from("/pkg"),
        "pkg".to_owned(),
        Arc::new(index),
    );
    ctx_index::Registry::new("/root", vec![Arc::new(indexer)])
}

fn bench_sql_rebuild(c: &mut Criterion) {
    let registry = registry_with_n_symbols(500);

    c.bench_function("sql_rebuild_500_symbols", |b| {
        b.iter(|| {
            let mut conn = Connection::open_in_memory().unwrap();
            create_schema(&conn).unwrap();
            rebuild(&mut conn, black_box(&registry)).unwrap();
        })
    });
}

fn bench_sql_execute_select(c: &mut Criterion) {
    let registry = registry_with_n_symbols(500);
    let mut conn = Connection::open_in_memory().unwrap();
    create_schema(&conn).unwrap();
    rebuild(&mut conn, &registry).unwrap();

    c.bench_function("sql_execute_select_by_name", |b| {
        b.iter(|| {
            execute(
                &conn,
                black_box("SELECT * FROM symbols WHERE name = ?1"),
                black_box(&[SqlValue::Text("Sym250".to_owned())]),
                10_000,
            )
            .unwrap()
        })
    });

    c.bench_function("sql_execute_select_all_occurrences", |b| {
        b.iter(|| {
            execute(&conn, black_box("SELECT * FROM occurrences"), &[], 10_000).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_hash_bytes,
    bench_index_update_document,
    bench_index_find_symbols,
    bench_index_get_symbol,
    bench_sql_rebuild,
    bench_sql_execute_select,
);
criterion_main!(benches);
