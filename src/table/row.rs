//! Row, column and cell value types for editable tables.

#[cfg(test)]
#[path = "row_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTITY
// =============================================================================

/// Stable identity of a row. Order and invoice tables key by number, pending
/// orders by reference string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// VALUES
// =============================================================================

/// Declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Text,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Convert to the declared column kind.
    ///
    /// Numeric columns parse text input and fall back to `0` for anything
    /// that is not a finite number. Text columns format numbers.
    #[must_use]
    pub fn coerce(self, kind: FieldKind) -> Self {
        match (kind, self) {
            (FieldKind::Number, Self::Number(n)) => Self::Number(if n.is_finite() { n } else { 0.0 }),
            (FieldKind::Number, Self::Text(raw)) => {
                Self::Number(raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0))
            }
            (FieldKind::Text, Self::Number(n)) => Self::Text(n.to_string()),
            (FieldKind::Text, text @ Self::Text(_)) => text,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// COLUMNS + ROWS
// =============================================================================

/// A declared table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub kind: FieldKind,
}

impl Column {
    #[must_use]
    pub fn number(field: impl Into<String>) -> Self {
        Self { field: field.into(), kind: FieldKind::Number }
    }

    #[must_use]
    pub fn text(field: impl Into<String>) -> Self {
        Self { field: field.into(), kind: FieldKind::Text }
    }
}

/// One record of a table: an identity plus named cell values.
///
/// Serializes flat, e.g. `{"id": 7, "customer": "Acme", "qty": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Row {
    #[must_use]
    pub fn new(id: impl Into<RowId>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new() }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Write or clear a field. `None` removes it.
    pub fn put(&mut self, field: &str, value: Option<FieldValue>) {
        match value {
            Some(value) => {
                self.fields.insert(field.to_owned(), value);
            }
            None => {
                self.fields.remove(field);
            }
        }
    }
}
