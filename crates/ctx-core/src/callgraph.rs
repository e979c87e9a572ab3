//! Call-graph synthesis: ties a reference occurrence to the innermost
//! enclosing definition in the same document.
//!
//! Shared between [`crate::index::ScipIndex`]'s in-memory `calls_of`/
//! `callers_of` and the SQL projection's `relationships(kind='calls')` rows,
//! so both observe the same tie-breaking rule.

use crate::model::{Document, OccurrenceInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

/// Definitions without an `enclosing_end_line` contribute no call edges.
/// Ties (two definitions spanning the same range) resolve to the one with
/// the smaller `start_line`, i.e. leftmost in source order.
pub fn synthesize_calls(doc: &Document) -> Vec<CallEdge> {
    let mut defs: Vec<&OccurrenceInfo> = doc
        .occurrences
        .iter()
        .filter(|o| o.is_definition && o.enclosing_end_line.is_some())
        .collect();
    defs.sort_by_key(|d| d.range.start_line);

    let mut edges = Vec::new();
    for reference in doc.occurrences.iter().filter(|o| !o.is_definition) {
        let line = reference.range.start_line;
        let mut best: Option<(&OccurrenceInfo, i32)> = None;
        for def in &defs {
            let end = def.enclosing_end_line.expect("filtered above");
            if def.range.start_line <= line && line <= end {
                let span = end - def.range.start_line;
                match best {
                    None => best = Some((def, span)),
                    Some((_, best_span)) if span < best_span => best = Some((def, span)),
                    _ => {}
                }
            }
        }
        if let Some((def, _)) = best {
            edges.push(CallEdge {
                caller: def.symbol.clone(),
                callee: reference.symbol.clone(),
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Range;

    fn def(symbol: &str, start: i32, end: i32) -> OccurrenceInfo {
        OccurrenceInfo {
            symbol: symbol.to_owned(),
            file: "lib/c.dart".to_owned(),
            range: Range {
                start_line: start,
                start_column: 0,
                end_line: start,
                end_column: 1,
            },
            is_definition: true,
            enclosing_end_line: Some(end),
        }
    }

    fn reference(symbol: &str, line: i32) -> OccurrenceInfo {
        OccurrenceInfo {
            symbol: symbol.to_owned(),
            file: "lib/c.dart".to_owned(),
            range: Range {
                start_line: line,
                start_column: 0,
                end_line: line,
                end_column: 1,
            },
            is_definition: false,
            enclosing_end_line: None,
        }
    }

    #[test]
    fn reference_inside_outer_calls_inner() {
        let doc = Document {
            relative_path: "lib/c.dart".to_owned(),
            language: Some("dart".to_owned()),
            symbols: vec![],
            occurrences: vec![def("outer", 0, 2), reference("inner", 1)],
        };
        let edges = synthesize_calls(&doc);
        assert_eq!(edges, vec![CallEdge { caller: "outer".to_owned(), callee: "inner".to_owned() }]);
    }

    #[test]
    fn reference_outside_any_definition_contributes_no_edge() {
        let doc = Document {
            relative_path: "lib/c.dart".to_owned(),
            language: Some("dart".to_owned()),
            symbols: vec![],
            occurrences: vec![def("outer", 0, 2), reference("inner", 10)],
        };
        assert!(synthesize_calls(&doc).is_empty());
    }

    #[test]
    fn picks_innermost_enclosing_definition() {
        let doc = Document {
            relative_path: "lib/c.dart".to_owned(),
            language: Some("dart".to_owned()),
            symbols: vec![],
            occurrences: vec![
                def("outer", 0, 10),
                def("inner_def", 2, 4),
                reference("callee", 3),
            ],
        };
        let edges = synthesize_calls(&doc);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].caller, "inner_def");
    }

    #[test]
    fn tie_breaks_leftmost() {
        let doc = Document {
            relative_path: "lib/c.dart".to_owned(),
            language: Some("dart".to_owned()),
            symbols: vec![],
            occurrences: vec![
                def("first", 0, 5),
                def("second", 0, 5),
                reference("callee", 2),
            ],
        };
        let edges = synthesize_calls(&doc);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].caller, "first");
    }
}
