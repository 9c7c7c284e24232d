//! Batch file loading.
//!
//! A batch is either a bare JSON array of records or the extractor's
//! envelope object (`{"individuals": [...], "totalCount": .., "extractionDate": ..}`
//! or the same with `"entities"`). Elements are not decoded here.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::core::error::AppError;

use super::{PartyKind, SourceRecord};

/// Envelope keys that may hold the record array, per party kind.
fn envelope_keys(kind: PartyKind) -> &'static [&'static str] {
    match kind {
        PartyKind::Person => &["individuals", "records"],
        PartyKind::Organisation => &["entities", "organisations", "organizations", "records"],
    }
}

/// Read a batch file from disk.
pub fn load_batch(path: &Path, kind: PartyKind) -> Result<Vec<SourceRecord>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Input(format!("cannot read {}: {e}", path.display())))?;
    let records = parse_batch(&text, kind)
        .map_err(|e| AppError::Input(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), kind = %kind, count = records.len(), "batch loaded");
    Ok(records)
}

/// Split batch JSON text into per-record source values.
pub fn parse_batch(text: &str, kind: PartyKind) -> Result<Vec<SourceRecord>, String> {
    let root: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;

    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            let key = envelope_keys(kind)
                .iter()
                .find(|k| obj.get(**k).is_some_and(Value::is_array))
                .ok_or_else(|| {
                    format!(
                        "expected a JSON array or an object with one of {:?}",
                        envelope_keys(kind)
                    )
                })?;
            match obj.remove(*key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        other => return Err(format!("expected a JSON array, got {}", type_name(&other))),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, body)| SourceRecord::new(index, kind, body))
        .collect())
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
