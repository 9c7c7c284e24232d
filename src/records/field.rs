//! Tri-state field: distinguishes "key not present" from "present but empty".

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strings the extractor emits when it has nothing to say.
const PLACEHOLDERS: &[&str] = &["", "null", "n/a", "na", "none", "undefined"];

/// A record field as it arrived from the extractor.
///
/// - `Absent`: the key was not in the record. Use `#[serde(default)]`.
/// - `NoValue`: the key was present with `null` or a placeholder string.
/// - `Value`: a real value; strings are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    NoValue,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Property-patch form: `None` leaves the stored property untouched,
    /// `Some(Null)` clears it, `Some(v)` overwrites it.
    pub fn to_patch(&self) -> Option<Value>
    where
        T: Serialize,
    {
        match self {
            Field::Absent => None,
            Field::NoValue => Some(Value::Null),
            Field::Value(v) => Some(serde_json::to_value(v).unwrap_or(Value::Null)),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Field::Value(v),
            None => Field::NoValue,
        }
    }
}

fn is_placeholder(s: &str) -> bool {
    let t = s.trim();
    PLACEHOLDERS.iter().any(|p| t.eq_ignore_ascii_case(p))
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let value = match value {
            Value::Null => return Ok(Field::NoValue),
            Value::String(s) if is_placeholder(&s) => return Ok(Field::NoValue),
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        };

        match T::deserialize(value.clone()) {
            Ok(v) => Ok(Field::Value(v)),
            // Extractors sometimes emit ids and refs as bare numbers.
            Err(first) => match value {
                Value::Number(n) => T::deserialize(Value::String(n.to_string()))
                    .map(Field::Value)
                    .map_err(|_| de::Error::custom(first)),
                _ => Err(de::Error::custom(first)),
            },
        }
    }
}

/// A list-valued field that tolerates bad elements.
///
/// A JSON array decodes element by element through [`Field`]; `null`,
/// placeholder and undecodable elements are dropped with a debug log so one
/// broken alias or address never fails the whole record. Any non-array value
/// is taken as a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Items<T>(pub Vec<T>);

impl<T> Items<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Items(Vec::new())
    }
}

impl<'a, T> IntoIterator for &'a Items<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Items<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = match Value::deserialize(deserializer)? {
            Value::Array(list) => list,
            single => vec![single],
        };
        let mut items = Vec::with_capacity(elements.len());
        for (pos, element) in elements.into_iter().enumerate() {
            match Field::<T>::deserialize(element) {
                Ok(Field::Value(v)) => items.push(v),
                Ok(_) => tracing::debug!(pos, "empty list element skipped"),
                Err(e) => tracing::debug!(pos, error = %e, "undecodable list element skipped"),
            }
        }
        Ok(Items(items))
    }
}
