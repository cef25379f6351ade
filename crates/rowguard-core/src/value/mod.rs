mod compare;
mod input;


use crate::types::Decimal;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};
use std::fmt;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

// re-exports
pub use compare::{TextMode, TextOp};

pub(crate) use compare::casefold;
pub use input::{Input, ToPrimitive};

///
/// Value
///
/// Normalized value produced by validation; one canonical in-memory
/// representation per scalar kind.
///
/// Null  → SQL NULL (for JSON columns: the column is unset).
/// Json  → stored JSON document, where `Json(Null)` is a JSON `null`.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    DateTime(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    Decimal(Decimal),
    Enum(String),
    Float(f64),
    Int(i64),
    Json(JsonValue),
    /// Ordered list of values for scalar-list columns and `in` operands.
    List(Vec<Self>),
    Null,
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Enum(text) => Some(text),
            _ => None,
        }
    }

    /// Render as JSON, the wire form used for re-serialization.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::DateTime(dt) => dt
                .format(&Rfc3339)
                .map_or(JsonValue::Null, JsonValue::String),
            Self::Decimal(d) => JsonValue::String(d.to_string()),
            Self::Enum(text) | Self::Text(text) => JsonValue::String(text.clone()),
            Self::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Self::Int(i) => JsonValue::Number(Number::from(*i)),
            Self::Json(json) => json.clone(),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Null => JsonValue::Null,
        }
    }

    /// Re-serialize into raw input so the value can be validated again.
    #[must_use]
    pub fn to_input(&self) -> Input {
        Input::from(self.to_json())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) | Self::Enum(text) => write!(f, "{text:?}"),
            Self::Decimal(d) => write!(f, "{d}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
