use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;

///
/// IssueKind
///
/// Stable classification of a validation issue.
/// Every variant is recoverable; static wiring errors live in
/// `model::RegistryError` instead.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[remain::sorted]
pub enum IssueKind {
    /// Leaf scalar, JSON, or decimal value failed validation.
    FieldValidation,
    /// To-one relation given a many-shaped payload or vice versa.
    RelationCardinality,
    /// Structural mismatch (wrong container, conflicting alternatives).
    Shape,
    /// Key not recognised for the entity or operator vocabulary.
    UnknownField,
    /// No declared field-set was satisfied by the candidate key.
    UnresolvedUniqueKey,
}

impl IssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FieldValidation => "field_validation",
            Self::RelationCardinality => "relation_cardinality",
            Self::Shape => "shape",
            Self::UnknownField => "unknown_field",
            Self::UnresolvedUniqueKey => "unresolved_unique_key",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Received
///
/// What the caller actually supplied at the issue path.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Received {
    Missing,
    Shape(String),
    Value(serde_json::Value),
}

impl fmt::Display for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("nothing"),
            Self::Shape(shape) => f.write_str(shape),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

///
/// Issue
///
/// One structured validation failure.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Issue {
    /// Dot-separated path from the payload root; empty at the root.
    pub path: String,
    pub kind: IssueKind,
    pub expected: String,
    pub received: Received,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "<root>"
        } else {
            self.path.as_str()
        };

        write!(f, "{path}: {} ({})", self.message, self.kind)
    }
}

///
/// ValidationError
///
/// All issues collected for one payload, in depth-first order.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, ThisError)]
#[error("validation failed with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Whether any collected issue has the given kind.
    #[must_use]
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    /// Issues recorded at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |issue| issue.path == path)
    }

    /// Render the issue list as a JSON array for transport layers.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.issues).unwrap_or(serde_json::Value::Null)
    }
}

fn summarize(issues: &[Issue]) -> String {
    match issues {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}
