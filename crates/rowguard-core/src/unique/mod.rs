//! Module: unique
//! Responsibility: resolve caller input to one row by any accepted field-set.
//! Does not own: declaring key sets (see `model::unique`).
//!
//! Resolution is a set-covering match: every supplied field is validated,
//! then each declared field-set whose fields are all present is satisfied.
//! Overlapping sets are all honored; zero satisfied sets is an error naming
//! every attempted set.

#[cfg(test)]
mod tests;

use crate::{
    error::{IssueKind, Received},
    model::{registry::SchemaInfo, unique::KeySet},
    validate::{Context, scalar},
    value::{Input, Value},
};
use serde::Serialize;
use std::collections::BTreeMap;

///
/// ResolvedKey
///
/// Validated unique key: the satisfied field-sets (declaration priority,
/// primary first) and the flat field values that satisfy them.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedKey {
    pub sets: Vec<KeySet>,
    pub values: BTreeMap<String, Value>,
}

impl ResolvedKey {
    /// Highest-priority satisfied set.
    #[must_use]
    pub fn preferred(&self) -> Option<&KeySet> {
        self.sets.first()
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Re-serialize as flat raw input; resolving it again yields `self`.
    #[must_use]
    pub fn to_input(&self) -> Input {
        Input::object(
            self.values
                .iter()
                .map(|(field, value)| (field.clone(), value.to_input())),
        )
    }
}

pub(crate) fn resolve<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<ResolvedKey> {
    let map = ctx.object(input, &format!("{} unique key object", info.name()))?;
    let before = ctx.issue_count();
    let mut values = BTreeMap::new();

    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        if info.is_key_field(key) {
            if let Some(value) = ctx.at(key, |ctx| key_value(ctx, info, key, raw)) {
                merge(ctx, &mut values, key, value);
            }
            continue;
        }
        if let Some(set) = compound(info, key) {
            ctx.at(key, |ctx| {
                for (field, value) in compound_values(ctx, info, set, raw)? {
                    merge(ctx, &mut values, &field, value);
                }
                Some(())
            });
            continue;
        }

        ctx.unknown(key, accepted_keys(info));
    }

    if ctx.issue_count() != before {
        return None;
    }

    let sets: Vec<KeySet> = info
        .key_sets()
        .iter()
        .filter(|set| set.fields.iter().all(|field| values.contains_key(*field)))
        .cloned()
        .collect();

    if sets.is_empty() {
        let attempted = info
            .key_sets()
            .iter()
            .map(KeySet::describe)
            .collect::<Vec<_>>()
            .join(" | ");
        let supplied = values.keys().cloned().collect::<Vec<_>>().join(", ");
        ctx.issue(
            IssueKind::UnresolvedUniqueKey,
            attempted,
            Received::Shape(format!("fields {{{supplied}}}")),
            format!("input does not satisfy any unique key of {}", info.name()),
        );
        return None;
    }

    Some(ResolvedKey { sets, values })
}

fn compound<'a>(info: &'a SchemaInfo, key: &str) -> Option<&'a KeySet> {
    info.key_sets()
        .iter()
        .find(|set| set.is_compound() && set.name == key)
}

fn key_value(ctx: &mut Context<'_>, info: &SchemaInfo, name: &str, raw: &Input) -> Option<Value> {
    let field = info.field(name)?;
    if raw.is_null() {
        ctx.invalid(
            field.kind.to_string(),
            raw,
            "null is never a valid unique key value",
        );
        return None;
    }

    scalar::scalar_value(ctx, field.kind, raw)
}

// `{"a_b": {"a": .., "b": ..}}`; every member of the set is required.
fn compound_values(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    set: &KeySet,
    raw: &Input,
) -> Option<Vec<(String, Value)>> {
    let map = ctx.object(raw, &set.describe())?;
    let before = ctx.issue_count();
    let mut out = Vec::with_capacity(set.fields.len());

    for key in map.keys() {
        if !set.fields.contains(&key.as_str()) {
            ctx.unknown(key, format!("one of {}", set.describe()));
        }
    }
    for &field in &set.fields {
        let value = ctx.at(field, |ctx| match map.get(field) {
            Some(raw) => key_value(ctx, info, field, raw),
            None => {
                ctx.missing(
                    set.describe(),
                    format!("compound key '{}' requires '{field}'", set.name),
                );
                None
            }
        });
        out.extend(value.map(|value| (field.to_string(), value)));
    }

    (ctx.issue_count() == before).then_some(out)
}

// The same field supplied flat and nested must agree.
fn merge(ctx: &mut Context<'_>, values: &mut BTreeMap<String, Value>, field: &str, value: Value) {
    match values.get(field) {
        Some(existing) if *existing != value => {
            let input = value.to_input();
            ctx.at(field, |ctx| {
                ctx.shape(
                    existing.to_string(),
                    &input,
                    format!("'{field}' is supplied twice with different values"),
                );
                None::<()>
            });
        }
        Some(_) => {}
        None => {
            values.insert(field.to_string(), value);
        }
    }
}

fn accepted_keys(info: &SchemaInfo) -> String {
    let mut keys: Vec<String> = Vec::new();
    for set in info.key_sets() {
        for field in &set.fields {
            if !keys.iter().any(|k| k == field) {
                keys.push((*field).to_string());
            }
        }
        if set.is_compound() {
            keys.push(set.name.clone());
        }
    }

    format!("one of [{}]", keys.join(", "))
}
