use crate::COMPOUND_KEY_SEPARATOR;
use serde::Serialize;

///
/// UniqueModel
///
/// One accepted field-set for resolving a single row. Single-field sets
/// come from `@unique`/`@id` columns, multi-field sets from compound keys.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UniqueModel {
    /// Explicit compound name; defaults to the fields joined by `_`.
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
    pub primary: bool,
}

impl UniqueModel {
    #[must_use]
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self {
            name: None,
            fields,
            primary: false,
        }
    }

    #[must_use]
    pub const fn primary(fields: &'static [&'static str]) -> Self {
        Self {
            name: None,
            fields,
            primary: true,
        }
    }

    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub const fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }

    /// Key under which a compound set may be supplied as a nested object.
    #[must_use]
    pub fn key_name(&self) -> String {
        self.name.map_or_else(
            || self.fields.join(COMPOUND_KEY_SEPARATOR),
            ToString::to_string,
        )
    }
}

///
/// KeySet
///
/// Field-set resolved from a `UniqueModel` at registry build time.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct KeySet {
    pub name: String,
    pub fields: Vec<&'static str>,
    pub primary: bool,
}

impl KeySet {
    pub(crate) fn from_model(model: &UniqueModel) -> Self {
        Self {
            name: model.key_name(),
            fields: model.fields.to_vec(),
            primary: model.primary,
        }
    }

    #[must_use]
    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }

    /// Render as `{a, b}` for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{{{}}}", self.fields.join(", "))
    }
}
