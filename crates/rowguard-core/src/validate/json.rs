//! Module: validate::json
//! Responsibility: recursive validation of free-form JSON column values.
//! Does not own: path-addressed JSON filter operators (see `filter::parse`).
//!
//! Three flavors share one recursive schema:
//! - storage: values read back from storage; `null` at the top of a nullable
//!   column means the column is unset
//! - input: write payloads; boxed `ToPrimitive` values are unwrapped once
//! - filter: operands of JSON filters
//!
//! String sentinels are checked before the generic JSON value, so the text
//! `"DbNull"` can never be stored as a plain JSON string at the top level.

use crate::{
    validate::{Context, Lazy, Schema},
    value::{Input, Value},
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

pub(crate) const DB_NULL: &str = "DbNull";
pub(crate) const JSON_NULL: &str = "JsonNull";
pub(crate) const ANY_NULL: &str = "AnyNull";

const SENTINELS: [&str; 3] = [DB_NULL, JSON_NULL, ANY_NULL];

static STORAGE_JSON: Lazy<JsonSchema> = Lazy::new(|| JsonSchema::new(JsonFlavor::Storage));
static INPUT_JSON: Lazy<JsonSchema> = Lazy::new(|| JsonSchema::new(JsonFlavor::Input));
static FILTER_JSON: Lazy<JsonSchema> = Lazy::new(|| JsonSchema::new(JsonFlavor::Filter));

///
/// JsonOperand
///
/// Right-hand side of a JSON `equals`/`not` filter.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum JsonOperand {
    /// Column is SQL NULL or holds JSON `null`.
    AnyNull,
    /// Column is SQL NULL.
    DbNull,
    /// Column holds JSON `null`.
    JsonNull,
    Value(JsonValue),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum JsonFlavor {
    Filter,
    Input,
    Storage,
}

///
/// JsonSchema
///

struct JsonSchema {
    flavor: JsonFlavor,
}

impl JsonSchema {
    const fn new(flavor: JsonFlavor) -> Self {
        Self { flavor }
    }

    // Children resolve through the lazy static, never a fresh schema.
    fn children(&self) -> &'static Lazy<Self> {
        match self.flavor {
            JsonFlavor::Filter => &FILTER_JSON,
            JsonFlavor::Input => &INPUT_JSON,
            JsonFlavor::Storage => &STORAGE_JSON,
        }
    }
}

impl Schema for JsonSchema {
    type Output = JsonValue;

    fn validate(&self, ctx: &mut Context<'_>, input: &Input) -> Option<JsonValue> {
        match input {
            Input::Null => Some(JsonValue::Null),
            Input::Bool(b) => Some(JsonValue::Bool(*b)),
            Input::Number(n) => Some(JsonValue::Number(n.clone())),
            Input::Text(text) => Some(JsonValue::String(text.clone())),
            Input::List(items) => {
                let before = ctx.issue_count();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    if let Some(value) = ctx.at(index, |ctx| self.children().validate(ctx, item)) {
                        out.push(value);
                    }
                }

                (ctx.issue_count() == before).then_some(JsonValue::Array(out))
            }
            Input::Object(map) => {
                let before = ctx.issue_count();
                let mut out = Map::new();
                for (key, item) in map {
                    if let Some(value) = ctx.at(key, |ctx| self.children().validate(ctx, item)) {
                        out.insert(key.clone(), value);
                    }
                }

                (ctx.issue_count() == before).then_some(JsonValue::Object(out))
            }
            Input::Boxed(boxed) if self.flavor == JsonFlavor::Input => Some(boxed.to_primitive()),
            Input::Boxed(_) => {
                ctx.invalid(
                    "JSON value",
                    input,
                    "boxed values are only accepted in write payloads",
                );
                None
            }
            Input::DateTime(_) | Input::Decimal(_) => {
                ctx.invalid(
                    "JSON value",
                    input,
                    format!("{} is not a JSON value", input.shape()),
                );
                None
            }
        }
    }
}

// Classify a top-level string as a sentinel, a malformed sentinel, or plain text.
fn sentinel<'a>(ctx: &mut Context<'_>, input: &'a Input) -> Result<Option<&'a str>, ()> {
    let Some(text) = input.as_str() else {
        return Ok(None);
    };
    if let Some(exact) = SENTINELS.iter().find(|s| **s == text) {
        return Ok(Some(*exact));
    }
    if let Some(close) = SENTINELS.iter().find(|s| s.eq_ignore_ascii_case(text)) {
        ctx.invalid(
            format!("\"{close}\""),
            input,
            format!("malformed null sentinel '{text}'"),
        );
        return Err(());
    }

    Ok(None)
}

/// JSON column value in a create/update payload.
pub(crate) fn write_value(
    ctx: &mut Context<'_>,
    nullable: bool,
    input: &Input,
) -> Option<Value> {
    match sentinel(ctx, input).ok()? {
        Some(DB_NULL) if nullable => return Some(Value::Null),
        Some(DB_NULL) => {
            ctx.invalid(
                format!("JSON value or \"{JSON_NULL}\""),
                input,
                "DbNull is only valid on nullable JSON fields",
            );
            return None;
        }
        Some(JSON_NULL) => return Some(Value::Json(JsonValue::Null)),
        Some(_) => {
            ctx.invalid("JSON value", input, "AnyNull is only valid in filters");
            return None;
        }
        None => {}
    }

    if input.is_null() {
        let expected = if nullable {
            format!("JSON value, \"{JSON_NULL}\" or \"{DB_NULL}\"")
        } else {
            format!("JSON value or \"{JSON_NULL}\"")
        };
        ctx.invalid(
            expected,
            input,
            "use a null sentinel instead of a top-level null",
        );
        return None;
    }

    INPUT_JSON.validate(ctx, input).map(Value::Json)
}

/// JSON column value read back from storage.
pub(crate) fn storage_value(
    ctx: &mut Context<'_>,
    nullable: bool,
    input: &Input,
) -> Option<Value> {
    if input.is_null() {
        return Some(if nullable {
            Value::Null
        } else {
            Value::Json(JsonValue::Null)
        });
    }

    STORAGE_JSON.validate(ctx, input).map(Value::Json)
}

/// Plain JSON operand (array_contains, lt, ...).
pub(crate) fn filter_value(ctx: &mut Context<'_>, input: &Input) -> Option<JsonValue> {
    FILTER_JSON.validate(ctx, input)
}

/// Operand of JSON `equals`/`not`, sentinels first.
pub(crate) fn filter_operand(
    ctx: &mut Context<'_>,
    nullable: bool,
    input: &Input,
) -> Option<JsonOperand> {
    match sentinel(ctx, input).ok()? {
        Some(DB_NULL) if !nullable => {
            ctx.invalid(
                format!("JSON value, \"{JSON_NULL}\" or \"{ANY_NULL}\""),
                input,
                "DbNull is only valid on nullable JSON fields",
            );
            return None;
        }
        Some(DB_NULL) => return Some(JsonOperand::DbNull),
        Some(JSON_NULL) => return Some(JsonOperand::JsonNull),
        Some(_) => return Some(JsonOperand::AnyNull),
        None => {}
    }

    if input.is_null() {
        ctx.invalid(
            "JSON value or null sentinel",
            input,
            "use a null sentinel instead of a top-level null",
        );
        return None;
    }

    filter_value(ctx, input).map(JsonOperand::Value)
}

///
/// TESTS
///
