//! Classification arrays embedded in detail page data
//!
//! Detail pages ship their business profile as JSON inside the markup. The
//! arrays of interest look like `"businessTypes": ["General Contractor"]` or
//! `"providedServices": [{"id": 4, "name": "Concrete"}]`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// An embedded array and how to render it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedArray {
    /// JSON key of the array
    pub key: &'static str,

    /// Keep at most this many entries
    pub limit: Option<usize>,
}

/// Company type source
pub const BUSINESS_TYPES: EmbeddedArray = EmbeddedArray {
    key: "businessTypes",
    limit: None,
};

/// Market and services source
pub const CONSTRUCTION_SECTORS: EmbeddedArray = EmbeddedArray {
    key: "constructionSectors",
    limit: None,
};

/// Trades and services source, truncated to the first three entries
pub const PROVIDED_SERVICES: EmbeddedArray = EmbeddedArray {
    key: "providedServices",
    limit: Some(3),
};

impl EmbeddedArray {
    /// Finds the array in `raw` and renders its entries comma-joined
    ///
    /// Returns `None` when the array is absent or has no usable entries.
    pub fn render(&self, raw: &str) -> Option<String> {
        let mut entries = array_entries(raw, self.key)?;
        if let Some(limit) = self.limit {
            entries.truncate(limit);
        }
        Some(entries.join(", "))
    }
}

/// Extracts the text entries of the first non-empty `"key": [...]` array
///
/// String entries are taken as-is; object entries contribute their `name`.
/// Arrays that are not strict JSON are read with a looser quoted-string scan.
pub fn array_entries(raw: &str, key: &str) -> Option<Vec<String>> {
    let needle = format!("\"{}\"", key);

    raw.match_indices(&needle).find_map(|(start, _)| {
        let body = array_body(&raw[start + needle.len()..])?;
        let entries = parse_json_entries(body).unwrap_or_else(|| scan_entries(body));
        (!entries.is_empty()).then_some(entries)
    })
}

/// Returns the `[...]` text following `: ` at the start of `rest`
fn array_body(rest: &str) -> Option<&str> {
    let rest = rest.trim_start().strip_prefix(':')?.trim_start();
    if !rest.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_json_entries(body: &str) -> Option<Vec<String>> {
    let items: Vec<Value> = serde_json::from_str(body).ok()?;

    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(map) => map.get("name").and_then(Value::as_str),
                _ => None,
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Loose fallback: `name` values if present, otherwise every quoted string
fn scan_entries(body: &str) -> Vec<String> {
    let (name_re, quoted_re) = scan_regexes();

    let names: Vec<String> = name_re
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if !names.is_empty() {
        return names;
    }

    quoted_re
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn scan_regexes() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r#""name"\s*:\s*"([^"]+)""#).expect("valid name regex"),
            Regex::new(r#""([^"]+)""#).expect("valid quoted string regex"),
        )
    })
}
