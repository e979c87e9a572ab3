//! SCIP symbol identifier parsing.
//!
//! Format: `scheme manager package_name version descriptor_path`
//!
//! Descriptor suffix characters: `#` (term), `.` (type/namespace),
//! `()` (method), `[]` (type parameter).
//!
//! Reference: <https://github.com/sourcegraph/scip/blob/main/docs/reference.md>

/// A parsed SCIP symbol identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScipSymbol {
    pub scheme: String,
    pub manager: String,
    pub package_name: String,
    pub version: String,
    /// `/`-split path components of the descriptor, each retaining its suffix.
    pub descriptors: Vec<String>,
    /// Raw descriptor path, used by `symbol_name` for right-to-left scanning.
    pub(crate) descriptor_path: String,
}

/// Parse a SCIP symbol string into a `ScipSymbol`.
///
/// Returns `None` for empty strings or strings missing any of the four
/// required header tokens or a non-empty descriptor path. Local symbols
/// (the bare `local <id>` form SCIP uses for unexported identifiers) also
/// return `None` here since they carry no package/version header.
pub fn parse_symbol(symbol_str: &str) -> Option<ScipSymbol> {
    if symbol_str.is_empty() || symbol_str.starts_with("local ") {
        return None;
    }
    let mut parts = symbol_str.splitn(5, ' ');
    let scheme = parts.next()?.to_owned();
    let manager = parts.next()?.to_owned();
    let package_name = parts.next()?.to_owned();
    let version = parts.next()?.to_owned();
    let descriptor_path = parts.next()?.to_owned();

    if descriptor_path.is_empty() {
        return None;
    }

    let descriptors: Vec<String> = descriptor_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_owned())
        .collect();

    Some(ScipSymbol {
        scheme,
        manager,
        package_name,
        version,
        descriptors,
        descriptor_path,
    })
}

fn is_suffix_or_sep(c: char) -> bool {
    matches!(c, '#' | '.' | ')' | '(' | ']' | '[')
}

/// Extract the simple function/class/field name from a raw SCIP symbol string.
///
/// Scans the descriptor path from the right: skips trailing suffix/separator
/// characters (`# . ) ( ] [`), then collects name characters until the next
/// suffix or path separator (`/`). Falls back to the raw string (minus any
/// trailing suffix char) when the string does not parse as a full SCIP symbol,
/// so unindexed/opaque identifiers still get a usable display name.
///
/// Examples:
///   `scip-dart pub greeter 1.0.0 lib/a.dart/Greeter#hello().` -> `hello`
///   `scip-dart pub greeter 1.0.0 lib/a.dart/Greeter#`         -> `Greeter`
pub fn symbol_name(raw: &str) -> String {
    match parse_symbol(raw) {
        Some(sym) => symbol_name_of(&sym),
        None => raw.trim_end_matches(is_suffix_or_sep).to_owned(),
    }
}

fn symbol_name_of(symbol: &ScipSymbol) -> String {
    let path = &symbol.descriptor_path;
    if path.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = path.chars().collect();
    let len = chars.len();

    let mut end = len;
    while end > 0 && is_suffix_or_sep(chars[end - 1]) {
        end -= 1;
    }
    if end == 0 {
        return String::new();
    }

    let mut start = end;
    while start > 0 {
        let c = chars[start - 1];
        if is_suffix_or_sep(c) || c == '/' {
            break;
        }
        start -= 1;
    }

    chars[start..end].iter().collect()
}

/// Return `true` if `raw`'s simple name matches `name` (case-sensitive).
pub fn symbol_matches_name(raw: &str, name: &str) -> bool {
    symbol_name(raw) == name
}

/// The container prefix: the substring up to and including the last `#`
/// before the final descriptor segment, or `None` for top-level symbols.
///
/// `lib/a.dart/Greeter#hello().` -> `Some("scip-dart pub greeter 1.0.0 lib/a.dart/Greeter#")`
pub fn container_id(raw: &str) -> Option<String> {
    let sym = parse_symbol(raw)?;
    let path = &sym.descriptor_path;
    if path.is_empty() {
        return None;
    }

    // Same boundary scan as `symbol_name_of`: trim the symbol's own trailing
    // suffix/separator characters, then walk left to where its own
    // descriptor name begins.
    let chars: Vec<char> = path.chars().collect();
    let len = chars.len();

    let mut end = len;
    while end > 0 && is_suffix_or_sep(chars[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 {
        let c = chars[start - 1];
        if is_suffix_or_sep(c) || c == '/' {
            break;
        }
        start -= 1;
    }

    // A container exists only when the symbol's own descriptor is directly
    // preceded by a `#` (an enclosing type); a `/` (a bare file path) or the
    // start of the descriptor path (a top-level symbol) means there is none.
    if start == 0 || chars[start - 1] != '#' {
        return None;
    }

    let header_len = raw.len() - path.len();
    Some(raw[..header_len + start].to_owned())
}
