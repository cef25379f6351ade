use crate::{
    model::field::{FieldModel, ScalarKind},
    validate::{Context, scalar},
    value::{Input, Value},
};
use serde::Serialize;

const UPDATE_OPS: [&str; 6] = ["decrement", "divide", "increment", "multiply", "push", "set"];

///
/// FieldUpdate
///
/// One scalar update operation; a bare literal is `Set`.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum FieldUpdate {
    Decrement(Value),
    Divide(Value),
    Increment(Value),
    Multiply(Value),
    Push(Vec<Value>),
    Set(Value),
}

// An object is an operation object only when every key is an operation;
// decimal triples and JSON documents stay literals.
fn is_operation(field: &FieldModel, input: &Input) -> bool {
    field.kind != ScalarKind::Json
        && input.as_object().is_some_and(|map| {
            !map.is_empty() && map.keys().all(|key| UPDATE_OPS.contains(&key.as_str()))
        })
}

pub(super) fn update(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    input: &Input,
) -> Option<FieldUpdate> {
    let Some(map) = input.as_object().filter(|_| is_operation(field, input)) else {
        return scalar::field_value(ctx, field, input).map(FieldUpdate::Set);
    };
    if map.len() != 1 {
        ctx.shape(
            "object with exactly one update operation",
            input,
            format!("'{}' takes exactly one update operation", field.name),
        );
        return None;
    }

    let (key, raw) = map.iter().next()?;
    match key.as_str() {
        "set" => ctx.at(key, |ctx| scalar::field_value(ctx, field, raw).map(FieldUpdate::Set)),
        "push" => push(ctx, field, key, raw),
        op => arithmetic(ctx, field, op, raw),
    }
}

fn arithmetic(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    key: &str,
    raw: &Input,
) -> Option<FieldUpdate> {
    if field.list || !field.kind.is_numeric() {
        ctx.unsupported(
            key,
            "one of [set]",
            format!("'{key}' requires a numeric field, '{}' is {}", field.name, field.describe()),
        );
        return None;
    }

    let value = ctx.at(key, |ctx| {
        if raw.is_null() {
            ctx.invalid(field.kind.to_string(), raw, format!("'{key}' takes a number"));
            return None;
        }
        let value = scalar::scalar_value(ctx, field.kind, raw)?;
        if key == "divide" && is_zero(&value) {
            ctx.invalid(
                format!("non-zero {}", field.kind),
                raw,
                "division by zero",
            );
            return None;
        }

        Some(value)
    })?;

    match key {
        "decrement" => Some(FieldUpdate::Decrement(value)),
        "divide" => Some(FieldUpdate::Divide(value)),
        "increment" => Some(FieldUpdate::Increment(value)),
        _ => Some(FieldUpdate::Multiply(value)),
    }
}

// `push` takes one element or a list of elements.
fn push(ctx: &mut Context<'_>, field: &FieldModel, key: &str, raw: &Input) -> Option<FieldUpdate> {
    if !field.list {
        ctx.unsupported(
            key,
            "one of [set]",
            format!("'push' requires a list field, '{}' is {}", field.name, field.describe()),
        );
        return None;
    }

    ctx.at(key, |ctx| {
        let values = match raw {
            Input::List(_) => {
                let items = ctx.list(raw, &field.describe())?;
                scalar::element_values(ctx, field.kind, items)?
            }
            Input::Null => {
                ctx.invalid(field.kind.to_string(), raw, "list elements cannot be null");
                return None;
            }
            _ => vec![scalar::scalar_value(ctx, field.kind, raw)?],
        };

        Some(FieldUpdate::Push(values))
    })
}

#[expect(clippy::float_cmp)]
fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(n) => *n == 0,
        Value::Float(f) => *f == 0.0,
        Value::Decimal(d) => d.is_zero(),
        _ => false,
    }
}
