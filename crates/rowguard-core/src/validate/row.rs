use crate::{
    model::{field::ScalarKind, registry::SchemaInfo},
    validate::{Context, json, scalar},
    value::{Input, Value},
};
use std::collections::BTreeMap;

///
/// RecordRelation
///

#[derive(Clone, Debug, PartialEq)]
pub enum RecordRelation {
    One(Option<Box<Record>>),
    Many(Vec<Record>),
}

///
/// Record
///
/// Row re-validated against its entity schema; scalar columns plus any
/// related rows the storage collaborator loaded alongside it.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, RecordRelation>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_one(mut self, name: &str, related: Option<Self>) -> Self {
        self.relations
            .insert(name.to_string(), RecordRelation::One(related.map(Box::new)));
        self
    }

    #[must_use]
    pub fn with_many(mut self, name: &str, related: Vec<Self>) -> Self {
        self.relations
            .insert(name.to_string(), RecordRelation::Many(related));
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RecordRelation> {
        self.relations.get(name)
    }
}

/// Validate one stored row: every column present, JSON in storage flavor,
/// loaded relations validated recursively against their targets.
pub(crate) fn parse_row<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<Record> {
    let map = ctx.object(input, &format!("{} row object", info.name()))?;
    let before = ctx.issue_count();
    let mut record = Record::new();

    for field in info.model.fields {
        let value = ctx.at(field.name, |ctx| match map.get(field.name) {
            None => {
                ctx.missing(field.describe(), format!("row is missing '{}'", field.name));
                None
            }
            Some(raw) if field.kind == ScalarKind::Json && !field.list => {
                json::storage_value(ctx, field.nullable, raw)
            }
            Some(raw) => scalar::field_value(ctx, field, raw),
        });
        if let Some(value) = value {
            record.fields.insert(field.name.to_string(), value);
        }
    }

    for (key, raw) in map {
        if info.field(key).is_some() {
            continue;
        }
        let Some(relation) = info.relation(key) else {
            ctx.unknown(key, format!("a column or relation of {}", info.name()));
            continue;
        };
        let Some(target) = ctx.target(relation) else {
            continue;
        };

        let related = ctx.at(key, |ctx| match (relation.is_many(), raw) {
            (false, Input::Null) if relation.nullable => Some(RecordRelation::One(None)),
            (false, Input::Object(_)) => {
                parse_row(ctx, target, raw).map(|row| RecordRelation::One(Some(Box::new(row))))
            }
            (true, Input::List(items)) => {
                let rows: Vec<_> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| ctx.at(index, |ctx| parse_row(ctx, target, item)))
                    .collect();
                (rows.len() == items.len()).then_some(RecordRelation::Many(rows))
            }
            (false, Input::Null) => {
                ctx.invalid("related row object", raw, format!("'{key}' is a required relation"));
                None
            }
            (true, _) => {
                ctx.cardinality(
                    "list of related rows",
                    raw,
                    format!("'{key}' is a to-many relation"),
                );
                None
            }
            (false, _) => {
                ctx.cardinality(
                    "related row object",
                    raw,
                    format!("'{key}' is a to-one relation"),
                );
                None
            }
        });
        if let Some(related) = related {
            record.relations.insert(key.clone(), related);
        }
    }

    (ctx.issue_count() == before).then_some(record)
}
