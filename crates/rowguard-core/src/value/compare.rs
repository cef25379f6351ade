use crate::value::Value;
use serde::Serialize;
use std::cmp::Ordering;

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum TextMode {
    #[default]
    Cs, // case-sensitive
    Ci, // case-insensitive
}

impl Value {
    /// Strict comparator for identical orderable variants.
    ///
    /// Integers and floats compare numerically with each other; every
    /// other mismatched pair returns `None`.
    #[must_use]
    pub fn strict_order_cmp(left: &Self, right: &Self) -> Option<Ordering> {
        match (left, right) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.partial_cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.partial_cmp(b),
            (Self::Enum(a), Self::Enum(b)) | (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            #[expect(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            #[expect(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            _ => None,
        }
    }

    /// Equality under a text mode; non-text values ignore the mode.
    #[must_use]
    pub fn eq_with_mode(&self, other: &Self, mode: TextMode) -> bool {
        match (self, other, mode) {
            (Self::Text(a), Self::Text(b), TextMode::Ci) => casefold(a) == casefold(b),
            _ => Self::strict_order_cmp(self, other)
                .map_or_else(|| self == other, Ordering::is_eq),
        }
    }

    /// Ordering under a text mode.
    #[must_use]
    pub fn cmp_with_mode(&self, other: &Self, mode: TextMode) -> Option<Ordering> {
        match (self, other, mode) {
            (Self::Text(a), Self::Text(b), TextMode::Ci) => Some(casefold(a).cmp(&casefold(b))),
            _ => Self::strict_order_cmp(self, other),
        }
    }

    /// Substring, prefix and suffix tests on text values.
    #[must_use]
    pub fn text_matches(&self, needle: &str, mode: TextMode, op: TextOp) -> Option<bool> {
        let Self::Text(haystack) = self else {
            return None;
        };

        let (haystack, needle) = match mode {
            TextMode::Cs => (haystack.clone(), needle.to_string()),
            TextMode::Ci => (casefold(haystack), casefold(needle)),
        };

        Some(match op {
            TextOp::Contains => haystack.contains(&needle),
            TextOp::StartsWith => haystack.starts_with(&needle),
            TextOp::EndsWith => haystack.ends_with(&needle),
        })
    }
}

///
/// TextOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

pub(crate) fn casefold(input: &str) -> String {
    if input.is_ascii() {
        return input.to_ascii_lowercase();
    }

    input.to_lowercase()
}
