use crate::{
    config::ValidatorConfig,
    error::{Issue, IssueKind, Received, ValidationError},
    model::{
        registry::{Registry, SchemaInfo},
        relation::RelationModel,
    },
    obs::{self, Operation, ValidationEvent},
    value::Input,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write,
};

///
/// PathSegment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

///
/// Context
///
/// Per-call validation state: the current path, collected issues, and
/// whether a structural error has halted the walk.
///
/// Leaf issues accumulate depth-first. Shape and cardinality issues are
/// fatal: once recorded, `at` stops descending and callers unwind.
///

pub(crate) struct Context<'r> {
    config: &'r ValidatorConfig,
    registry: Option<&'r Registry>,
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
    halted: bool,
}

impl<'r> Context<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self {
            config: registry.config(),
            registry: Some(registry),
            path: Vec::new(),
            issues: Vec::new(),
            halted: false,
        }
    }

    /// Context for registry-free leaf validation.
    pub(crate) const fn detached(config: &'r ValidatorConfig) -> Self {
        Self {
            config,
            registry: None,
            path: Vec::new(),
            issues: Vec::new(),
            halted: false,
        }
    }

    pub(crate) const fn config(&self) -> &'r ValidatorConfig {
        self.config
    }

    /// Schema of a relation's target entity.
    pub(crate) fn target(&self, relation: &RelationModel) -> Option<&'r SchemaInfo> {
        self.registry
            .and_then(|registry| registry.info(relation.target))
    }

    pub(crate) const fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) const fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Run `f` one path segment deeper.
    pub(crate) fn at<T>(
        &mut self,
        segment: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        if self.halted {
            return None;
        }

        self.path.push(segment.into());
        let out = if self.path.len() > self.config.max_depth {
            let max = self.config.max_depth;
            self.fatal(
                IssueKind::Shape,
                format!("at most {max} levels of nesting"),
                Received::Missing,
                "input nesting exceeds the maximum depth",
            );
            None
        } else {
            f(self)
        };
        self.path.pop();

        out
    }

    pub(crate) fn path(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                PathSegment::Key(key) => out.push_str(key),
                PathSegment::Index(index) => {
                    let _ = write!(out, "{index}");
                }
            }
        }

        out
    }

    pub(crate) fn issue(
        &mut self,
        kind: IssueKind,
        expected: impl Into<String>,
        received: Received,
        message: impl Into<String>,
    ) {
        let issue = Issue {
            path: self.path(),
            kind,
            expected: expected.into(),
            received,
            message: message.into(),
        };
        self.issues.push(issue);
    }

    pub(crate) fn fatal(
        &mut self,
        kind: IssueKind,
        expected: impl Into<String>,
        received: Received,
        message: impl Into<String>,
    ) {
        self.issue(kind, expected, received, message);
        self.halted = true;
    }

    /// Leaf value failed validation.
    pub(crate) fn invalid(
        &mut self,
        expected: impl Into<String>,
        input: &Input,
        message: impl Into<String>,
    ) {
        self.issue(
            IssueKind::FieldValidation,
            expected,
            Received::Value(input.to_json()),
            message,
        );
    }

    /// Required value absent.
    pub(crate) fn missing(&mut self, expected: impl Into<String>, message: impl Into<String>) {
        self.issue(IssueKind::FieldValidation, expected, Received::Missing, message);
    }

    /// Structural mismatch; halts the walk.
    pub(crate) fn shape(
        &mut self,
        expected: impl Into<String>,
        input: &Input,
        message: impl Into<String>,
    ) {
        self.fatal(
            IssueKind::Shape,
            expected,
            Received::Shape(input.describe()),
            message,
        );
    }

    /// Cardinality mismatch on a relation; halts the walk.
    pub(crate) fn cardinality(
        &mut self,
        expected: impl Into<String>,
        input: &Input,
        message: impl Into<String>,
    ) {
        self.fatal(
            IssueKind::RelationCardinality,
            expected,
            Received::Shape(input.describe()),
            message,
        );
    }

    /// Unrecognised key, reported at the key's own path.
    pub(crate) fn unknown(&mut self, key: &str, expected: impl Into<String>) {
        self.unsupported(key, expected, format!("unknown key '{key}'"));
    }

    /// Key recognised in general but not valid in this position.
    pub(crate) fn unsupported(
        &mut self,
        key: &str,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) {
        let (expected, message) = (expected.into(), message.into());
        self.at(key, |ctx| {
            ctx.issue(
                IssueKind::UnknownField,
                expected,
                Received::Shape(format!("key '{key}'")),
                message,
            );
            None::<()>
        });
    }

    /// Borrow an object or report a shape error.
    pub(crate) fn object<'i>(
        &mut self,
        input: &'i Input,
        expected: &str,
    ) -> Option<&'i BTreeMap<String, Input>> {
        if let Some(map) = input.as_object() {
            return Some(map);
        }
        self.shape(expected, input, format!("expected {expected}"));

        None
    }

    /// Borrow an argument object, rejecting unknown keys and reporting
    /// missing required ones.
    pub(crate) fn args<'i>(
        &mut self,
        input: &'i Input,
        expected: &str,
        required: &[&str],
        optional: &[&str],
    ) -> Option<&'i BTreeMap<String, Input>> {
        let map = self.object(input, expected)?;
        let before = self.issue_count();
        let known: BTreeSet<&str> = required.iter().chain(optional).copied().collect();

        for key in map.keys() {
            if !known.contains(key.as_str()) {
                let listed: Vec<&str> = known.iter().copied().collect();
                self.unknown(key, format!("one of [{}]", listed.join(", ")));
            }
        }
        for &key in required {
            if !map.contains_key(key) {
                self.at(key, |ctx| {
                    ctx.missing(expected, format!("'{key}' is required"));
                    None::<()>
                });
            }
        }

        (self.issue_count() == before).then_some(map)
    }

    /// Read a list, enforcing the configured length limit.
    pub(crate) fn list<'i>(&mut self, input: &'i Input, expected: &str) -> Option<&'i [Input]> {
        let Some(items) = input.as_list() else {
            self.invalid(expected, input, format!("expected {expected}"));
            return None;
        };
        let max = self.config.max_list_len;
        if items.len() > max {
            self.issue(
                IssueKind::Shape,
                format!("at most {max} elements"),
                Received::Shape(input.describe()),
                "list exceeds the maximum length",
            );
            return None;
        }

        Some(items)
    }

    /// Close the call, returning the value only if no issue was recorded.
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ if self.issues.is_empty() => Err(ValidationError::new(vec![Issue {
                path: String::new(),
                kind: IssueKind::Shape,
                expected: "valid payload".to_string(),
                received: Received::Missing,
                message: "payload could not be validated".to_string(),
            }])),
            _ => Err(ValidationError::new(self.issues)),
        }
    }

    /// `finish`, reporting the outcome to the validation sink.
    pub(crate) fn finish_for<T>(
        self,
        entity: &'static str,
        operation: Operation,
        value: Option<T>,
    ) -> Result<T, ValidationError> {
        let result = self.finish(value);
        let event = match &result {
            Ok(_) => ValidationEvent::Accepted { entity, operation },
            Err(err) => ValidationEvent::Rejected {
                entity,
                operation,
                issues: err.issues.len(),
                first_path: err
                    .issues
                    .first()
                    .map(|issue| issue.path.clone())
                    .unwrap_or_default(),
            },
        };
        obs::record(&event);

        result
    }
}
