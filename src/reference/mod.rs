//! Reference normalizer: free-text country strings to canonical countries.
//!
//! Lookup is exact against the synonym table in [`countries`] after case and
//! whitespace normalization. No fuzzy matching: text that is not in the table
//! is [`Resolution::Unresolved`], which callers treat as "omit the edge".

mod countries;

use serde::Serialize;

/// Canonical country, keyed in the graph by its ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Country {
    pub name: &'static str,
    pub code: &'static str,
}

impl Country {
    pub const fn new(name: &'static str, code: &'static str) -> Self {
        Self { name, code }
    }
}

/// Outcome of resolving free text against a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Unresolved,
}

impl<T> Resolution<T> {
    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(v) => Some(v),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Resolve a nationality, birthplace, or address country string.
///
/// When the text contains a comma only the last non-empty segment is tried
/// first (`"Perm Oblast, Russia"` and `"Russia,"` → Russia); if that misses,
/// the whole string is tried so that table entries containing commas still
/// match.
pub fn normalize_country(text: &str) -> Resolution<Country> {
    let whole = normalize_text(text);
    if whole.is_empty() {
        return Resolution::Unresolved;
    }

    if text.contains(',') {
        let last = text.rsplit(',').map(normalize_text).find(|s| !s.is_empty());
        if let Some(country) = last.as_deref().and_then(countries::lookup) {
            return Resolution::Resolved(country);
        }
    }

    match countries::lookup(&whole) {
        Some(country) => Resolution::Resolved(country),
        None => Resolution::Unresolved,
    }
}

/// Lower-case, collapse whitespace runs, trim, and drop a trailing full stop.
fn normalize_text(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches('.')
        .trim_end()
        .to_string()
}
