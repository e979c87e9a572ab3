//! Typed in-memory representation of SCIP data: symbols, occurrences, documents.

use serde::{Deserialize, Serialize};

/// Closed enumeration of symbol kinds the projection and index understand.
/// Anything the upstream indexer emits outside this set collapses to `Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Method,
    Function,
    Field,
    Constructor,
    Enum,
    EnumMember,
    Interface,
    Variable,
    Property,
    Parameter,
    Mixin,
    Extension,
    Getter,
    Setter,
    TypeAlias,
    Unspecified,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Function => "function",
            SymbolKind::Field => "field",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::Interface => "interface",
            SymbolKind::Variable => "variable",
            SymbolKind::Property => "property",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Mixin => "mixin",
            SymbolKind::Extension => "extension",
            SymbolKind::Getter => "getter",
            SymbolKind::Setter => "setter",
            SymbolKind::TypeAlias => "typealias",
            SymbolKind::Unspecified => "unspecified",
        }
    }

    pub fn from_scip(kind: scip::types::symbol_information::Kind) -> Self {
        use scip::types::symbol_information::Kind;
        match kind {
            Kind::Class | Kind::Struct => SymbolKind::Class,
            Kind::Method | Kind::StaticMethod | Kind::InstanceMethod => SymbolKind::Method,
            Kind::Function => SymbolKind::Function,
            Kind::Field => SymbolKind::Field,
            Kind::Constructor => SymbolKind::Constructor,
            Kind::Enum => SymbolKind::Enum,
            Kind::EnumMember => SymbolKind::EnumMember,
            Kind::Interface | Kind::Protocol | Kind::Trait => SymbolKind::Interface,
            Kind::Variable | Kind::ConstantGetter | Kind::Constant => SymbolKind::Variable,
            Kind::Property => SymbolKind::Property,
            Kind::Parameter | Kind::TypeParameter => SymbolKind::Parameter,
            Kind::Mixin => SymbolKind::Mixin,
            Kind::Extension => SymbolKind::Extension,
            Kind::Getter => SymbolKind::Getter,
            Kind::Setter => SymbolKind::Setter,
            Kind::Type => SymbolKind::TypeAlias,
            _ => SymbolKind::Unspecified,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge to another symbol, as declared by the upstream indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRelationship {
    pub target_symbol: String,
    pub is_implementation: bool,
    pub is_type_definition: bool,
    pub is_reference: bool,
}

/// Everything the index knows about one symbol, independent of where it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: String,
    pub kind: SymbolKind,
    pub display_name: Option<String>,
    pub documentation: Vec<String>,
    pub file: Option<String>,
    pub language: Option<String>,
    pub relationships: Vec<SymbolRelationship>,
}

/// A half-open range within one file: `[start_line, end_line)` in spirit, but
/// columns are end-exclusive on the final line, matching SCIP's own convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: i32,
    pub start_column: i32,
    pub end_line: i32,
    pub end_column: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceInfo {
    pub symbol: String,
    pub file: String,
    pub range: Range,
    pub is_definition: bool,
    /// Populated for definitions whose body spans multiple lines; used by
    /// call-graph synthesis to find the innermost enclosing definition.
    pub enclosing_end_line: Option<i32>,
}

/// The SCIP record for one source file. The atomic unit of incremental update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub relative_path: String,
    pub language: Option<String>,
    pub symbols: Vec<SymbolInfo>,
    pub occurrences: Vec<OccurrenceInfo>,
}

impl Document {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Document {
            relative_path: relative_path.into(),
            language: None,
            symbols: Vec::new(),
            occurrences: Vec::new(),
        }
    }
}

const SYMBOL_ROLE_DEFINITION: i32 = 1;

/// Decode a raw SCIP `Index` protobuf message into our typed `Document`s.
///
/// Consumes the upstream format bit-exactly: role bitflags, symbol kind enum,
/// and relationship flags are mapped one-to-one with no reinterpretation.
pub fn documents_from_scip_index(index: &scip::types::Index) -> Vec<Document> {
    index.documents.iter().map(document_from_scip).collect()
}

pub fn document_from_scip(doc: &scip::types::Document) -> Document {
    let language = if doc.language.is_empty() {
        None
    } else {
        Some(doc.language.clone())
    };

    let mut symbols = Vec::with_capacity(doc.symbols.len());
    for sym in &doc.symbols {
        let kind = SymbolKind::from_scip(sym.kind.enum_value_or_default());
        let relationships = sym
            .relationships
            .iter()
            .map(|r| SymbolRelationship {
                target_symbol: r.symbol.clone(),
                is_implementation: r.is_implementation,
                is_type_definition: r.is_type_definition,
                is_reference: r.is_reference,
            })
            .collect();
        symbols.push(SymbolInfo {
            symbol: sym.symbol.clone(),
            name: crate::symbol::symbol_name(&sym.symbol),
            kind,
            display_name: if sym.display_name.is_empty() {
                None
            } else {
                Some(sym.display_name.clone())
            },
            documentation: sym.documentation.clone(),
            file: Some(doc.relative_path.clone()),
            language: language.clone(),
            relationships,
        });
    }

    let mut occurrences = Vec::with_capacity(doc.occurrences.len());
    for occ in &doc.occurrences {
        let r = &occ.range;
        let (start_line, start_column, end_line, end_column) = match r.len() {
            3 => (r[0], r[1], r[0], r[2]),
            4 => (r[0], r[1], r[2], r[3]),
            _ => (0, 0, 0, 0),
        };
        let is_definition = occ.symbol_roles & SYMBOL_ROLE_DEFINITION != 0;
        occurrences.push(OccurrenceInfo {
            symbol: occ.symbol.clone(),
            file: doc.relative_path.clone(),
            range: Range {
                start_line,
                start_column,
                end_line,
                end_column,
            },
            is_definition,
            enclosing_end_line: match occ.enclosing_range.len() {
                3 => Some(occ.enclosing_range[0]),
                4 => Some(occ.enclosing_range[2]),
                _ => None,
            },
        });
    }

    Document {
        relative_path: doc.relative_path.clone(),
        language,
        symbols,
        occurrences,
    }
}
