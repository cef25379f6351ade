use crate::types::Decimal;
use serde_json::{Map, Number, Value as JsonValue};
use std::{collections::BTreeMap, fmt, sync::Arc};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

///
/// ToPrimitive
///
/// Capability of a boxed caller value to serialize itself into a plain
/// JSON primitive or tree. JSON input schemas unwrap it exactly once.
///

pub trait ToPrimitive: fmt::Debug + Send + Sync {
    fn to_primitive(&self) -> JsonValue;
}

///
/// Input
///
/// Raw, unvalidated caller value: a JSON-compatible tree plus the
/// native forms programmatic callers may hand in directly.
/// Object key order is insignificant.
///

#[derive(Clone, Debug)]
pub enum Input {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<Self>),
    Object(BTreeMap<String, Self>),
    /// Native date value.
    DateTime(OffsetDateTime),
    /// Native decimal value.
    Decimal(Decimal),
    /// Boxed value exposing a serialize-to-primitive capability.
    Boxed(Arc<dyn ToPrimitive>),
}

impl Input {
    /// Build an object from key/value pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short shape name used in error messages.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "array",
            Self::Object(_) => "object",
            Self::DateTime(_) => "date",
            Self::Decimal(_) => "decimal",
            Self::Boxed(_) => "boxed value",
        }
    }

    /// Describe the shape, listing object keys so typos are visible.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Object(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                format!("object with keys [{}]", keys.join(", "))
            }
            Self::List(items) => format!("array of length {}", items.len()),
            other => other.shape().to_string(),
        }
    }

    /// Render the input as JSON for error reporting and re-serialization.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => JsonValue::Number(n.clone()),
            Self::Text(text) => JsonValue::String(text.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Self::DateTime(dt) => dt
                .format(&Rfc3339)
                .map_or(JsonValue::Null, JsonValue::String),
            Self::Decimal(d) => JsonValue::String(d.to_string()),
            Self::Boxed(boxed) => boxed.to_primitive(),
        }
    }
}

impl From<JsonValue> for Input {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::Text(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<OffsetDateTime> for Input {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<Decimal> for Input {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}
