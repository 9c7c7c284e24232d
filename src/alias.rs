//! Alias canonicalizer.
//!
//! The canonical key is the storage key of an `Alias` node, so this function
//! must stay stable: changing it splits existing aliases from new ones.
//!
//! Steps:
//! - Unicode NFKD decomposition, then drop combining marks (`é` → `e`)
//! - Lowercase
//! - Drop every character that is not alphanumeric or whitespace
//! - Collapse whitespace runs to one space and trim

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Derive the deduplication key for an alias display string.
///
/// Total: any input yields a key. An empty key means the text had no
/// alphanumeric content; callers skip such aliases.
pub fn canonicalize(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
