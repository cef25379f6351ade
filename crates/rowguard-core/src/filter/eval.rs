//! Module: filter::eval
//! Responsibility: reference evaluation of a validated `Filter` against one row.
//! Does not own: filter validation or query planning.
//! Boundary: in-memory storage collaborators and tests evaluate through here.
//!
//! Comparisons follow SQL three-valued logic: anything compared with NULL
//! is unknown, `NOT unknown` stays unknown, and a row matches only when
//! the whole filter is definitely true.

use crate::{
    filter::ast::{
        AggregateFn, CompareOp, FieldFilter, Filter, JsonCondition, JsonFilter, ListCondition,
        ListFilter, RelationFilter, ScalarCondition, ScalarFilter,
    },
    validate::{JsonOperand, Record, RecordRelation},
    value::{TextMode, Value, casefold},
};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

///
/// FieldPresence
///
/// Result of reading a column from a row.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldPresence {
    Present(Value),
    /// Column not loaded on this row.
    Missing,
}

///
/// RelationPresence
///

pub enum RelationPresence<'a> {
    One(Option<&'a dyn Row>),
    Many(Vec<&'a dyn Row>),
    /// Relation not loaded on this row.
    Missing,
}

///
/// Row
///
/// Abstraction over a row source for filter evaluation.
///

pub trait Row {
    fn field(&self, name: &str) -> FieldPresence;

    fn relation(&self, _name: &str) -> RelationPresence<'_> {
        RelationPresence::Missing
    }

    /// Aggregate over a grouped row (`having` evaluation).
    fn aggregate(&self, _field: &str, _function: AggregateFn) -> FieldPresence {
        FieldPresence::Missing
    }
}

impl Row for Record {
    fn field(&self, name: &str) -> FieldPresence {
        match Self::field(self, name) {
            Some(value) => FieldPresence::Present(value.clone()),
            None => FieldPresence::Missing,
        }
    }

    fn relation(&self, name: &str) -> RelationPresence<'_> {
        match Self::relation(self, name) {
            Some(RecordRelation::One(related)) => {
                RelationPresence::One(related.as_deref().map(|row| row as &dyn Row))
            }
            Some(RecordRelation::Many(rows)) => {
                RelationPresence::Many(rows.iter().map(|row| row as &dyn Row).collect())
            }
            None => RelationPresence::Missing,
        }
    }
}

/// Evaluate a filter against a row; unknown counts as no match.
#[must_use]
pub fn eval(filter: &Filter, row: &dyn Row) -> bool {
    truth(filter, row) == Some(true)
}

// Kleene evaluation; `None` is SQL unknown.
fn truth(filter: &Filter, row: &dyn Row) -> Option<bool> {
    match filter {
        Filter::True => Some(true),
        Filter::False => Some(false),
        Filter::And(children) => all(children.iter().map(|child| truth(child, row))),
        Filter::Or(children) => any(children.iter().map(|child| truth(child, row))),
        Filter::Not(inner) => truth(inner, row).map(|b| !b),
        Filter::Field { field, filter } => match row.field(field) {
            FieldPresence::Present(value) => field_truth(filter, &value),
            FieldPresence::Missing => None,
        },
        Filter::Aggregate {
            field,
            function,
            filter,
        } => match row.aggregate(field, *function) {
            FieldPresence::Present(value) => scalar_truth(filter, &value),
            FieldPresence::Missing => None,
        },
        Filter::Relation { relation, filter } => relation_truth(filter, row.relation(relation)),
    }
}

fn all(values: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut out = Some(true);
    for value in values {
        match value {
            Some(false) => return Some(false),
            None => out = None,
            Some(true) => {}
        }
    }

    out
}

fn any(values: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut out = Some(false);
    for value in values {
        match value {
            Some(true) => return Some(true),
            None => out = None,
            Some(false) => {}
        }
    }

    out
}

fn field_truth(filter: &FieldFilter, value: &Value) -> Option<bool> {
    match filter {
        FieldFilter::Scalar(filter) => scalar_truth(filter, value),
        FieldFilter::List(filter) => list_truth(filter, value),
        FieldFilter::Json(filter) => json_truth(filter, value),
    }
}

fn scalar_truth(filter: &ScalarFilter, value: &Value) -> Option<bool> {
    let mode = filter.mode;
    all(filter
        .conditions
        .iter()
        .map(|condition| scalar_condition(condition, value, mode)))
}

fn scalar_condition(condition: &ScalarCondition, value: &Value, mode: TextMode) -> Option<bool> {
    match condition {
        ScalarCondition::Compare {
            op: CompareOp::Eq,
            value: Value::Null,
        } => Some(value.is_null()),
        ScalarCondition::NotIn(list) if list.is_empty() => Some(true),
        ScalarCondition::Not(inner) => scalar_truth(inner, value).map(|b| !b),
        _ if value.is_null() => None,
        ScalarCondition::Compare { op, value: operand } => Some(compare(value, operand, *op, mode)),
        ScalarCondition::In(list) => Some(list.iter().any(|item| value.eq_with_mode(item, mode))),
        ScalarCondition::NotIn(list) => {
            Some(!list.iter().any(|item| value.eq_with_mode(item, mode)))
        }
        ScalarCondition::Text { op, value: needle } => {
            Some(value.text_matches(needle, mode, *op).unwrap_or(false))
        }
    }
}

fn compare(left: &Value, right: &Value, op: CompareOp, mode: TextMode) -> bool {
    if op == CompareOp::Eq {
        return left.eq_with_mode(right, mode);
    }

    left.cmp_with_mode(right, mode)
        .is_some_and(|ordering| ordering_matches(ordering, op))
}

const fn ordering_matches(ordering: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Gte => ordering.is_ge(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Lte => ordering.is_le(),
    }
}

fn list_truth(filter: &ListFilter, value: &Value) -> Option<bool> {
    let Value::List(items) = value else {
        return None;
    };
    let has = |needle: &Value| items.iter().any(|item| item.eq_with_mode(needle, TextMode::Cs));

    all(filter.conditions.iter().map(|condition| {
        Some(match condition {
            ListCondition::Equals(expected) => {
                items.len() == expected.len()
                    && items
                        .iter()
                        .zip(expected)
                        .all(|(a, b)| a.eq_with_mode(b, TextMode::Cs))
            }
            ListCondition::Has(needle) => has(needle),
            ListCondition::HasEvery(needles) => needles.iter().all(has),
            ListCondition::HasSome(needles) => needles.iter().any(has),
            ListCondition::IsEmpty(empty) => items.is_empty() == *empty,
        })
    }))
}

// Column state seen by a JSON condition.
enum JsonTarget<'a> {
    // SQL NULL column, or a path that does not resolve
    Unset,
    Found(&'a JsonValue),
}

fn json_truth(filter: &JsonFilter, value: &Value) -> Option<bool> {
    let target = match value {
        Value::Json(doc) => {
            resolve_path(doc, &filter.path).map_or(JsonTarget::Unset, JsonTarget::Found)
        }
        Value::Null => JsonTarget::Unset,
        _ => return None,
    };

    all(filter
        .conditions
        .iter()
        .map(|condition| json_condition(condition, &target, filter.mode)))
}

fn resolve_path<'a>(doc: &'a JsonValue, path: &[String]) -> Option<&'a JsonValue> {
    path.iter().try_fold(doc, |node, key| match node {
        JsonValue::Object(map) => map.get(key),
        JsonValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn json_condition(
    condition: &JsonCondition,
    target: &JsonTarget<'_>,
    mode: TextMode,
) -> Option<bool> {
    match condition {
        JsonCondition::Equals(operand) => json_equals(operand, target),
        JsonCondition::Not(operand) => json_equals(operand, target).map(|b| !b),
        _ => {
            let JsonTarget::Found(found) = target else {
                return None;
            };
            Some(json_found(condition, found, mode))
        }
    }
}

fn json_equals(operand: &JsonOperand, target: &JsonTarget<'_>) -> Option<bool> {
    match (operand, target) {
        (JsonOperand::AnyNull, JsonTarget::Unset) | (JsonOperand::DbNull, JsonTarget::Unset) => {
            Some(true)
        }
        (JsonOperand::AnyNull | JsonOperand::JsonNull, JsonTarget::Found(found)) => {
            Some(found.is_null())
        }
        (JsonOperand::DbNull, JsonTarget::Found(_))
        | (JsonOperand::JsonNull, JsonTarget::Unset) => Some(false),
        (JsonOperand::Value(_), JsonTarget::Unset) => None,
        (JsonOperand::Value(expected), JsonTarget::Found(found)) => Some(*found == expected),
    }
}

fn json_found(condition: &JsonCondition, found: &JsonValue, mode: TextMode) -> bool {
    match condition {
        JsonCondition::String { op, value } => match found {
            JsonValue::String(text) => Value::Text(text.clone())
                .text_matches(value, mode, *op)
                .unwrap_or(false),
            _ => false,
        },
        JsonCondition::ArrayContains(needle) => json_array(found, |items| match needle {
            JsonValue::Array(needles) => needles.iter().all(|n| items.contains(n)),
            other => items.contains(other),
        }),
        JsonCondition::ArrayStartsWith(needle) => json_array(found, |items| match needle {
            JsonValue::Array(prefix) => items.starts_with(prefix),
            other => items.first() == Some(other),
        }),
        JsonCondition::ArrayEndsWith(needle) => json_array(found, |items| match needle {
            JsonValue::Array(suffix) => items.ends_with(suffix),
            other => items.last() == Some(other),
        }),
        JsonCondition::Compare { op, value } => {
            json_order(found, value, mode).is_some_and(|ordering| ordering_matches(ordering, *op))
        }
        JsonCondition::Equals(_) | JsonCondition::Not(_) => false,
    }
}

fn json_array(found: &JsonValue, f: impl FnOnce(&[JsonValue]) -> bool) -> bool {
    match found {
        JsonValue::Array(items) => f(items),
        _ => false,
    }
}

fn json_order(left: &JsonValue, right: &JsonValue, mode: TextMode) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(match mode {
            TextMode::Cs => a.cmp(b),
            TextMode::Ci => casefold(a).cmp(&casefold(b)),
        }),
        _ => None,
    }
}

fn relation_truth(filter: &RelationFilter, related: RelationPresence<'_>) -> Option<bool> {
    match (filter, related) {
        (_, RelationPresence::Missing) => None,
        (RelationFilter::Every(inner), RelationPresence::Many(rows)) => {
            Some(rows.iter().all(|row| truth(inner, *row) != Some(false)))
        }
        (RelationFilter::Some(inner), RelationPresence::Many(rows)) => {
            Some(rows.iter().any(|row| eval(inner, *row)))
        }
        (RelationFilter::None(inner), RelationPresence::Many(rows)) => {
            Some(!rows.iter().any(|row| eval(inner, *row)))
        }
        (RelationFilter::Is(None), RelationPresence::One(row)) => Some(row.is_none()),
        (RelationFilter::IsNot(None), RelationPresence::One(row)) => Some(row.is_some()),
        (RelationFilter::Is(Some(inner)), RelationPresence::One(row)) => {
            Some(row.is_some_and(|row| eval(inner, row)))
        }
        (RelationFilter::IsNot(Some(inner)), RelationPresence::One(row)) => {
            Some(!row.is_some_and(|row| eval(inner, row)))
        }
        _ => None,
    }
}
