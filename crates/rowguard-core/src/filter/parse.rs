//! Module: filter::parse
//! Responsibility: validate raw `where`/`having` trees into `Filter`.
//! Does not own: evaluation or normalization.
//!
//! Shape alternatives are resolved by structural inspection:
//! - a field value is an operator object only when every key is a known
//!   operator; anything else is sugar for `equals`
//! - on to-one relations `{is, isNot}` is tried before a direct filter

use crate::{
    filter::ast::{
        AggregateFn, CompareOp, Filter, JsonCondition, JsonFilter, ListCondition,
        ListFilter, RelationFilter, ScalarCondition, ScalarFilter,
    },
    model::{
        field::{FieldModel, ScalarKind},
        registry::SchemaInfo,
        relation::RelationModel,
    },
    validate::{Context, json, scalar},
    value::{Input, TextMode, TextOp, Value},
};
use std::collections::BTreeMap;

const COMBINATORS: [&str; 3] = ["AND", "OR", "NOT"];

const TEXT_OPS: &[&str] = &[
    "contains", "endsWith", "equals", "gt", "gte", "in", "lt", "lte", "mode", "not", "notIn",
    "startsWith",
];
const ORDERED_OPS: &[&str] = &["equals", "gt", "gte", "in", "lt", "lte", "not", "notIn"];
const ENUM_OPS: &[&str] = &["equals", "in", "not", "notIn"];
const BOOL_OPS: &[&str] = &["equals", "not"];
const LIST_OPS: &[&str] = &["equals", "has", "hasEvery", "hasSome", "isEmpty"];
const JSON_OPS: &[&str] = &[
    "array_contains",
    "array_ends_with",
    "array_starts_with",
    "equals",
    "gt",
    "gte",
    "lt",
    "lte",
    "mode",
    "not",
    "path",
    "string_contains",
    "string_ends_with",
    "string_starts_with",
];
const AGGREGATE_OPS: &[&str] = &["_avg", "_count", "_max", "_min", "_sum"];
const TO_MANY_OPS: &[&str] = &["every", "none", "some"];
const TO_ONE_OPS: &[&str] = &["is", "isNot"];

///
/// Scope
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Scope {
    Having,
    Where,
}

/// Global operator vocabulary used to tell operator objects from literals.
fn is_operator(key: &str) -> bool {
    [TEXT_OPS, LIST_OPS, JSON_OPS, AGGREGATE_OPS]
        .iter()
        .any(|ops| ops.contains(&key))
}

/// An object is read as operators unless the field also takes object
/// literals (decimal triples, JSON documents) and no key is an operator.
fn is_operator_object(field: &FieldModel, input: &Input) -> bool {
    let Some(map) = input.as_object() else {
        return false;
    };
    let takes_object_literal =
        !field.list && matches!(field.kind, ScalarKind::Decimal | ScalarKind::Json);

    map.is_empty() || !takes_object_literal || map.keys().any(|key| is_operator(key))
}

fn scalar_ops(kind: ScalarKind) -> &'static [&'static str] {
    match kind {
        ScalarKind::Text => TEXT_OPS,
        ScalarKind::Bool => BOOL_OPS,
        ScalarKind::Enum(_) => ENUM_OPS,
        ScalarKind::Json => JSON_OPS,
        _ => ORDERED_OPS,
    }
}

fn describe_ops(ops: &[&str]) -> String {
    format!("one of [{}]", ops.join(", "))
}

pub(crate) fn parse_where<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<Filter> {
    node(ctx, info, input, Scope::Where)
}

pub(crate) fn parse_having<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<Filter> {
    node(ctx, info, input, Scope::Having)
}

fn node<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
    scope: Scope,
) -> Option<Filter> {
    let map = ctx.object(input, "filter object")?;
    let before = ctx.issue_count();
    let mut parts = Vec::with_capacity(map.len());

    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        let part = match key.as_str() {
            "AND" => ctx.at(key, |ctx| combinator(ctx, info, raw, scope).map(Filter::And)),
            "OR" => ctx.at(key, |ctx| combinator(ctx, info, raw, scope).map(Filter::Or)),
            "NOT" => ctx.at(key, |ctx| negation(ctx, info, raw, scope)),
            _ => member(ctx, info, key, raw, scope),
        };
        parts.extend(part);
    }

    (ctx.issue_count() == before).then(|| Filter::all(parts))
}

// `AND` / `OR` operand: one node or an array of nodes.
fn combinator<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    raw: &Input,
    scope: Scope,
) -> Option<Vec<Filter>> {
    match raw {
        Input::Object(_) => node(ctx, info, raw, scope).map(|child| vec![child]),
        Input::List(items) => {
            let mut children = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                children.push(ctx.at(index, |ctx| node(ctx, info, item, scope)));
            }

            children.into_iter().collect()
        }
        _ => {
            ctx.shape(
                "filter object or array of filter objects",
                raw,
                "logical operators take a filter or an array of filters",
            );
            None
        }
    }
}

// `NOT` over an array holds when none of the members hold.
fn negation<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    raw: &Input,
    scope: Scope,
) -> Option<Filter> {
    if let Input::List(_) = raw {
        let children = combinator(ctx, info, raw, scope)?;
        return Some(Filter::And(children.into_iter().map(Filter::negate).collect()));
    }

    combinator(ctx, info, raw, scope)
        .and_then(|mut children| children.pop())
        .map(Filter::negate)
}

fn member<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    key: &str,
    raw: &Input,
    scope: Scope,
) -> Option<Filter> {
    if let Some(field) = info.field(key) {
        return ctx.at(key, |ctx| field_node(ctx, field, raw, scope));
    }

    if let Some(relation) = info.relation(key) {
        if scope == Scope::Having {
            ctx.unsupported(
                key,
                "a scalar field",
                format!("relation '{key}' cannot be filtered in having"),
            );
            return None;
        }
        let filters = ctx.at(key, |ctx| relation_filters(ctx, relation, raw))?;
        let parts = filters
            .into_iter()
            .map(|filter| Filter::relation(key, filter))
            .collect();

        return Some(Filter::all(parts));
    }

    let mut expected: Vec<&str> = info.model.fields.iter().map(|f| f.name).collect();
    expected.extend(info.model.relations.iter().map(|r| r.name));
    expected.extend(COMBINATORS);
    ctx.unknown(key, describe_ops(&expected));

    None
}

fn field_node(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    raw: &Input,
    scope: Scope,
) -> Option<Filter> {
    if field.list {
        return list_filter(ctx, field, raw).map(|filter| Filter::field(field.name, filter));
    }
    if field.kind == ScalarKind::Json {
        return json_filter(ctx, field, raw).map(|filter| Filter::field(field.name, filter));
    }

    let Some(map) = raw.as_object().filter(|_| is_operator_object(field, raw)) else {
        return operand(ctx, field, raw, true)
            .map(|value| Filter::field(field.name, ScalarFilter::equals(value)));
    };

    let before = ctx.issue_count();
    let (aggregates, plain): (Vec<_>, Vec<_>) = map
        .iter()
        .partition(|(key, _)| AGGREGATE_OPS.contains(&key.as_str()));

    let mut parts = Vec::new();
    if (!plain.is_empty() || aggregates.is_empty())
        && let Some(filter) = scalar_filter(ctx, field, plain)
    {
        parts.push(Filter::field(field.name, filter));
    }

    for (key, raw) in aggregates {
        if scope == Scope::Where {
            ctx.unsupported(
                key,
                describe_ops(scalar_ops(field.kind)),
                "aggregate filters are only valid in having",
            );
            continue;
        }
        parts.extend(aggregate_node(ctx, field, key, raw));
    }

    (ctx.issue_count() == before).then(|| Filter::all(parts))
}

fn scalar_filter<'i>(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    entries: impl IntoIterator<Item = (&'i String, &'i Input)>,
) -> Option<ScalarFilter> {
    let ops = scalar_ops(field.kind);
    let before = ctx.issue_count();
    let mut filter = ScalarFilter::default();

    for (key, raw) in entries {
        if !is_operator(key) {
            ctx.unknown(key, describe_ops(ops));
            continue;
        }
        if !ops.contains(&key.as_str()) {
            let message = if TEXT_OPS.contains(&key.as_str()) && !field.kind.is_text() {
                format!("operator '{key}' is only valid on string fields")
            } else {
                format!("operator '{key}' is not valid on {} fields", field.kind)
            };
            ctx.unsupported(key, describe_ops(ops), message);
            continue;
        }

        if key == "mode" {
            if let Some(mode) = ctx.at(key, |ctx| text_mode(ctx, raw)) {
                filter.mode = mode;
            }
            continue;
        }

        let condition = ctx.at(key, |ctx| scalar_condition(ctx, field, key, raw));
        filter.conditions.extend(condition);
    }

    // nested `not` filters inherit the enclosing mode
    if filter.mode == TextMode::Ci {
        for condition in &mut filter.conditions {
            if let ScalarCondition::Not(inner) = condition {
                inner.mode = TextMode::Ci;
            }
        }
    }

    (ctx.issue_count() == before).then_some(filter)
}

fn scalar_condition(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    key: &str,
    raw: &Input,
) -> Option<ScalarCondition> {
    match key {
        "equals" => operand(ctx, field, raw, true).map(|value| ScalarCondition::Compare {
            op: CompareOp::Eq,
            value,
        }),
        "in" => operand_list(ctx, field, raw).map(ScalarCondition::In),
        "notIn" => operand_list(ctx, field, raw).map(ScalarCondition::NotIn),
        "contains" | "startsWith" | "endsWith" => {
            let op = text_op(key)?;
            text_operand(ctx, raw).map(|value| ScalarCondition::Text { op, value })
        }
        "not" => not_operand(ctx, field, raw).map(|inner| ScalarCondition::Not(Box::new(inner))),
        other => {
            let op = CompareOp::ordering(other)?;
            operand(ctx, field, raw, false).map(|value| ScalarCondition::Compare { op, value })
        }
    }
}

fn text_op(key: &str) -> Option<TextOp> {
    match key {
        "contains" | "string_contains" => Some(TextOp::Contains),
        "startsWith" | "string_starts_with" => Some(TextOp::StartsWith),
        "endsWith" | "string_ends_with" => Some(TextOp::EndsWith),
        _ => None,
    }
}

// `not` takes a literal (including null) or a nested operator object.
fn not_operand(ctx: &mut Context<'_>, field: &FieldModel, raw: &Input) -> Option<ScalarFilter> {
    match raw.as_object() {
        Some(map) if is_operator_object(field, raw) => scalar_filter(ctx, field, map),
        _ => operand(ctx, field, raw, true).map(ScalarFilter::equals),
    }
}

fn operand(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    raw: &Input,
    allow_null: bool,
) -> Option<Value> {
    if raw.is_null() {
        if allow_null && field.nullable {
            return Some(Value::Null);
        }
        let message = if field.nullable {
            "null is only valid with equals and not"
        } else {
            "field is not nullable"
        };
        ctx.invalid(field.kind.to_string(), raw, message);
        return None;
    }

    scalar::scalar_value(ctx, field.kind, raw)
}

fn operand_list(ctx: &mut Context<'_>, field: &FieldModel, raw: &Input) -> Option<Vec<Value>> {
    let items = ctx.list(raw, &format!("array of {}", field.kind))?;
    scalar::element_values(ctx, field.kind, items)
}

fn text_operand(ctx: &mut Context<'_>, raw: &Input) -> Option<String> {
    if let Some(text) = raw.as_str() {
        return Some(text.to_string());
    }
    ctx.invalid("string", raw, "expected a string");

    None
}

fn text_mode(ctx: &mut Context<'_>, raw: &Input) -> Option<TextMode> {
    match raw.as_str() {
        Some("default") => Some(TextMode::Cs),
        Some("insensitive") => Some(TextMode::Ci),
        _ => {
            ctx.invalid("\"default\" | \"insensitive\"", raw, "unknown query mode");
            None
        }
    }
}

fn list_filter(ctx: &mut Context<'_>, field: &FieldModel, raw: &Input) -> Option<ListFilter> {
    let Some(map) = raw.as_object().filter(|_| is_operator_object(field, raw)) else {
        let values = operand_list(ctx, field, raw)?;
        return Some(ListFilter {
            conditions: vec![ListCondition::Equals(values)],
        });
    };

    let before = ctx.issue_count();
    let mut filter = ListFilter::default();
    for (key, raw) in map {
        if !LIST_OPS.contains(&key.as_str()) {
            ctx.unsupported(
                key,
                describe_ops(LIST_OPS),
                format!("operator '{key}' is not valid on list fields"),
            );
            continue;
        }
        let condition = ctx.at(key, |ctx| match key.as_str() {
            "equals" => operand_list(ctx, field, raw).map(ListCondition::Equals),
            "has" => operand(ctx, field, raw, false).map(ListCondition::Has),
            "hasEvery" => operand_list(ctx, field, raw).map(ListCondition::HasEvery),
            "hasSome" => operand_list(ctx, field, raw).map(ListCondition::HasSome),
            _ => match raw {
                Input::Bool(b) => Some(ListCondition::IsEmpty(*b)),
                _ => {
                    ctx.invalid("boolean", raw, "isEmpty takes a boolean");
                    None
                }
            },
        });
        filter.conditions.extend(condition);
    }

    (ctx.issue_count() == before).then_some(filter)
}

fn json_filter(ctx: &mut Context<'_>, field: &FieldModel, raw: &Input) -> Option<JsonFilter> {
    let Some(map) = raw.as_object().filter(|_| is_operator_object(field, raw)) else {
        let operand = json::filter_operand(ctx, field.nullable, raw)?;
        return Some(JsonFilter {
            conditions: vec![JsonCondition::Equals(operand)],
            ..JsonFilter::default()
        });
    };

    let before = ctx.issue_count();
    let mut filter = JsonFilter::default();
    for (key, raw) in map {
        if !JSON_OPS.contains(&key.as_str()) {
            ctx.unsupported(
                key,
                describe_ops(JSON_OPS),
                format!("operator '{key}' is not valid on json fields"),
            );
            continue;
        }
        match key.as_str() {
            "path" => {
                if let Some(path) = ctx.at(key, |ctx| json_path(ctx, raw)) {
                    filter.path = path;
                }
            }
            "mode" => {
                if let Some(mode) = ctx.at(key, |ctx| text_mode(ctx, raw)) {
                    filter.mode = mode;
                }
            }
            _ => {
                let condition = ctx.at(key, |ctx| json_condition(ctx, field, key, raw));
                filter.conditions.extend(condition);
            }
        }
    }

    (ctx.issue_count() == before).then_some(filter)
}

fn json_condition(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    key: &str,
    raw: &Input,
) -> Option<JsonCondition> {
    match key {
        "equals" => json::filter_operand(ctx, field.nullable, raw).map(JsonCondition::Equals),
        "not" => json::filter_operand(ctx, field.nullable, raw).map(JsonCondition::Not),
        "string_contains" | "string_starts_with" | "string_ends_with" => {
            let op = text_op(key)?;
            text_operand(ctx, raw).map(|value| JsonCondition::String { op, value })
        }
        "array_contains" => json::filter_value(ctx, raw).map(JsonCondition::ArrayContains),
        "array_starts_with" => json::filter_value(ctx, raw).map(JsonCondition::ArrayStartsWith),
        "array_ends_with" => json::filter_value(ctx, raw).map(JsonCondition::ArrayEndsWith),
        other => {
            let op = CompareOp::ordering(other)?;
            if raw.is_null() {
                ctx.invalid("JSON value", raw, "ordering operators cannot compare null");
                return None;
            }
            json::filter_value(ctx, raw).map(|value| JsonCondition::Compare { op, value })
        }
    }
}

// `["a", "b"]`, `"a.b"` or `"$.a.b"`
fn json_path(ctx: &mut Context<'_>, raw: &Input) -> Option<Vec<String>> {
    let expected = "array of keys or dotted path string";
    let segments = match raw {
        Input::List(items) => items
            .iter()
            .map(|item| item.as_str().map(ToString::to_string))
            .collect::<Option<Vec<_>>>(),
        Input::Text(text) => {
            let body = text
                .strip_prefix("$.")
                .or_else(|| text.strip_prefix('$'))
                .unwrap_or(text.as_str());
            if body.is_empty() {
                Some(Vec::new())
            } else {
                Some(body.split('.').map(ToString::to_string).collect())
            }
        }
        _ => None,
    };

    match segments {
        Some(segments) if segments.iter().all(|s| !s.is_empty()) => Some(segments),
        _ => {
            ctx.invalid(expected, raw, "malformed json path");
            None
        }
    }
}

// `_avg`, `_sum`, ... scoped to numeric columns.
fn aggregate_node(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    key: &str,
    raw: &Input,
) -> Option<Filter> {
    let function = AggregateFn::from_key(key)?;
    if !field.kind.is_numeric() {
        ctx.unsupported(
            key,
            "a numeric field",
            format!(
                "aggregate filter '{key}' requires a numeric field, '{}' is {}",
                field.name, field.kind
            ),
        );
        return None;
    }

    let result = aggregate_result(field, function);
    let filter = ctx.at(key, |ctx| match raw.as_object() {
        Some(map) if is_operator_object(&result, raw) => scalar_filter(ctx, &result, map),
        _ => operand(ctx, &result, raw, true).map(ScalarFilter::equals),
    })?;

    Some(Filter::Aggregate {
        field: field.name.to_string(),
        function,
        filter,
    })
}

/// Column model describing the result of an aggregate over `field`.
pub(crate) fn aggregate_result(field: &FieldModel, function: AggregateFn) -> FieldModel {
    match function {
        AggregateFn::Count => FieldModel::new(field.name, ScalarKind::BigInt),
        AggregateFn::Avg if field.kind == ScalarKind::Decimal => {
            FieldModel::new(field.name, ScalarKind::Decimal).nullable()
        }
        AggregateFn::Avg => FieldModel::new(field.name, ScalarKind::Float).nullable(),
        AggregateFn::Max | AggregateFn::Min | AggregateFn::Sum => {
            FieldModel::new(field.name, field.kind).nullable()
        }
    }
}

fn relation_filters(
    ctx: &mut Context<'_>,
    relation: &RelationModel,
    raw: &Input,
) -> Option<Vec<RelationFilter>> {
    let target = ctx.target(relation)?;

    if relation.is_many() {
        return to_many_filters(ctx, target, raw);
    }

    to_one_filter(ctx, relation, target, raw)
}

fn to_many_filters<'r>(
    ctx: &mut Context<'r>,
    target: &'r SchemaInfo,
    raw: &Input,
) -> Option<Vec<RelationFilter>> {
    let Some(map) = raw.as_object() else {
        ctx.cardinality(
            "{every | some | none}",
            raw,
            "to-many relation filters take every, some or none",
        );
        return None;
    };

    let before = ctx.issue_count();
    let mut filters = Vec::with_capacity(map.len());
    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        if !TO_MANY_OPS.contains(&key.as_str()) {
            if TO_ONE_OPS.contains(&key.as_str()) || is_member(target, key) {
                ctx.at(key, |ctx| {
                    ctx.cardinality(
                        "{every | some | none}",
                        raw,
                        "to-many relations must be filtered with every, some or none",
                    );
                    None::<()>
                });
            } else {
                ctx.unknown(key, describe_ops(TO_MANY_OPS));
            }
            continue;
        }

        let filter = ctx.at(key, |ctx| {
            let inner = Box::new(node(ctx, target, raw, Scope::Where)?);
            Some(match key.as_str() {
                "every" => RelationFilter::Every(inner),
                "none" => RelationFilter::None(inner),
                _ => RelationFilter::Some(inner),
            })
        });
        filters.extend(filter);
    }

    (ctx.issue_count() == before).then_some(filters)
}

fn to_one_filter<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    raw: &Input,
) -> Option<Vec<RelationFilter>> {
    match raw {
        Input::Null if relation.nullable => Some(vec![RelationFilter::Is(None)]),
        Input::Null => {
            ctx.invalid(
                format!("{} filter", target.name()),
                raw,
                format!("relation '{}' is required and cannot be null", relation.name),
            );
            None
        }
        Input::Object(map)
            if !map.is_empty() && map.keys().all(|k| TO_ONE_OPS.contains(&k.as_str())) =>
        {
            is_filters(ctx, relation, target, map)
        }
        Input::Object(map) if map.keys().any(|k| TO_MANY_OPS.contains(&k.as_str())) => {
            ctx.cardinality(
                format!("{} filter or {{is | isNot}}", target.name()),
                raw,
                "every, some and none apply to to-many relations",
            );
            None
        }
        Input::Object(_) => node(ctx, target, raw, Scope::Where)
            .map(|inner| vec![RelationFilter::Is(Some(Box::new(inner)))]),
        Input::List(_) => {
            ctx.cardinality(
                format!("{} filter", target.name()),
                raw,
                "to-one relation filters take a single filter object",
            );
            None
        }
        _ => {
            ctx.shape(
                format!("{} filter", target.name()),
                raw,
                "expected a relation filter object",
            );
            None
        }
    }
}

// `{is, isNot}`; when both are present each becomes its own conjunct.
fn is_filters<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    map: &BTreeMap<String, Input>,
) -> Option<Vec<RelationFilter>> {
    let mut out = Vec::with_capacity(map.len());
    for (key, raw) in map {
        let inner = ctx.at(key, |ctx| match raw {
            Input::Null if relation.nullable => Some(None),
            Input::Null => {
                ctx.invalid(
                    format!("{} filter", target.name()),
                    raw,
                    format!("relation '{}' is required and cannot be null", relation.name),
                );
                None
            }
            _ => node(ctx, target, raw, Scope::Where).map(|f| Some(Box::new(f))),
        })?;
        out.push(if key == "is" {
            RelationFilter::Is(inner)
        } else {
            RelationFilter::IsNot(inner)
        });
    }

    Some(out)
}

fn is_member(info: &SchemaInfo, key: &str) -> bool {
    info.field(key).is_some() || info.relation(key).is_some()
}
