//! Module: mutation
//! Responsibility: validate nested create/update payloads into mutation graphs.
//! Does not own: executing writes or enforcing storage constraints.
//!
//! A write payload is either the checked variant (relations written through
//! relation operations) or the unchecked variant (foreign keys written as
//! plain scalars). Any foreign-key scalar selects the unchecked variant;
//! mixing one with an owning relation write is a shape error.

mod field;
mod relation;


pub use field::FieldUpdate;
pub use relation::{ConnectOrCreate, NestedUpdate, NestedUpsert, RelationOp, Selector};

use crate::{
    filter::{Filter, parse::parse_where},
    model::registry::SchemaInfo,
    unique::{self, ResolvedKey},
    validate::{Context, scalar},
    value::{Input, Value},
};
use serde::Serialize;
use std::collections::BTreeMap;

///
/// WriteVariant
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum WriteVariant {
    #[default]
    Checked,
    Unchecked,
}

///
/// CreateInput
///
/// Validated create payload for one entity, relations included.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CreateInput {
    pub variant: WriteVariant,
    pub fields: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, Vec<RelationOp>>,
}

///
/// UpdateInput
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateInput {
    pub variant: WriteVariant,
    pub fields: BTreeMap<String, FieldUpdate>,
    pub relations: BTreeMap<String, Vec<RelationOp>>,
}

///
/// CreateManyArgs
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CreateManyArgs {
    pub data: Vec<CreateInput>,
    pub skip_duplicates: bool,
}

///
/// UpsertArgs
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpsertArgs {
    pub key: ResolvedKey,
    pub create: CreateInput,
    pub update: UpdateInput,
}

///
/// UpdateManyArgs
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateManyArgs {
    pub filter: Filter,
    pub data: UpdateInput,
}

///
/// WriteScope
///
/// Where a payload sits in the mutation graph.
///

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WriteScope<'a> {
    /// Relation on this entity pointing back at the enclosing parent; it and
    /// its foreign keys are set by the parent and cannot be written here.
    pub(crate) parent: Option<&'a str>,
    /// Scalar-only payloads (`createMany`, `updateMany` data).
    pub(crate) scalars_only: bool,
}

impl WriteScope<'_> {
    fn is_parent_member(&self, info: &SchemaInfo, key: &str) -> bool {
        let Some(parent) = self.parent else {
            return false;
        };

        key == parent || info.foreign_key(key) == Some(parent)
    }
}

pub(crate) fn parse_create<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<CreateInput> {
    create_input(ctx, info, input, WriteScope::default())
}

pub(crate) fn parse_update<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<UpdateInput> {
    update_input(ctx, info, input, WriteScope::default())
}

/// `{data: object | object[], skipDuplicates?}`
pub(crate) fn parse_create_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<CreateManyArgs> {
    create_many(ctx, info, input, None)
}

/// `{where: unique, create, update}`
pub(crate) fn parse_upsert<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<UpsertArgs> {
    let map = ctx.args(input, "upsert arguments", &["create", "update", "where"], &[])?;
    let scope = WriteScope::default();

    let key = ctx.at("where", |ctx| unique::resolve(ctx, info, &map["where"]));
    let create = ctx.at("create", |ctx| create_input(ctx, info, &map["create"], scope));
    let update = ctx.at("update", |ctx| update_input(ctx, info, &map["update"], scope));

    Some(UpsertArgs {
        key: key?,
        create: create?,
        update: update?,
    })
}

/// `{where?, data}`
pub(crate) fn parse_update_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<UpdateManyArgs> {
    update_many(ctx, info, input, None)
}

/// `{where?}`
pub(crate) fn parse_delete_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<Filter> {
    let map = ctx.args(input, "deleteMany arguments", &[], &["where"])?;

    optional_filter(ctx, info, map.get("where"))
}

pub(crate) fn create_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
    parent: Option<&str>,
) -> Option<CreateManyArgs> {
    let map = ctx.args(input, "createMany arguments", &["data"], &["skipDuplicates"])?;
    let scope = WriteScope {
        parent,
        scalars_only: true,
    };

    let data = ctx.at("data", |ctx| {
        let raw = &map["data"];
        if raw.as_object().is_some() {
            return create_input(ctx, info, raw, scope).map(|one| vec![one]);
        }
        let items = ctx.list(raw, &format!("{} create object or array", info.name()))?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            out.push(ctx.at(index, |ctx| create_input(ctx, info, item, scope)));
        }

        out.into_iter().collect()
    });
    let skip_duplicates = match map.get("skipDuplicates") {
        None => Some(false),
        Some(Input::Bool(b)) => Some(*b),
        Some(raw) => ctx.at("skipDuplicates", |ctx| {
            ctx.invalid("boolean", raw, "skipDuplicates takes a boolean");
            None
        }),
    };

    Some(CreateManyArgs {
        data: data?,
        skip_duplicates: skip_duplicates?,
    })
}

pub(crate) fn update_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
    parent: Option<&str>,
) -> Option<UpdateManyArgs> {
    let map = ctx.args(input, "updateMany arguments", &["data"], &["where"])?;
    let scope = WriteScope {
        parent,
        scalars_only: true,
    };

    let filter = optional_filter(ctx, info, map.get("where"));
    let data = ctx.at("data", |ctx| update_input(ctx, info, &map["data"], scope));

    Some(UpdateManyArgs {
        filter: filter?,
        data: data?,
    })
}

fn optional_filter<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    raw: Option<&Input>,
) -> Option<Filter> {
    match raw {
        Some(raw) => ctx.at("where", |ctx| parse_where(ctx, info, raw)),
        None => Some(Filter::And(Vec::new())),
    }
}

pub(crate) fn create_input<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
    scope: WriteScope<'_>,
) -> Option<CreateInput> {
    let map = ctx.object(input, &format!("{} create object", info.name()))?;
    let before = ctx.issue_count();
    let variant = variant(ctx, info, map, scope)?;
    let mut out = CreateInput {
        variant,
        ..CreateInput::default()
    };

    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        if let Some(field) = info.field(key) {
            if !check_writable(ctx, info, key, scope) {
                continue;
            }
            if let Some(value) = ctx.at(key, |ctx| scalar::field_value(ctx, field, raw)) {
                out.fields.insert(key.clone(), value);
            }
        } else if let Some(model) = info.relation(key) {
            if !check_relation(ctx, info, key, scope) {
                continue;
            }
            let ops = ctx.at(key, |ctx| relation::write(ctx, model, raw, relation::Mode::Create));
            if let Some(ops) = ops {
                out.relations.insert(key.clone(), ops);
            }
        } else {
            ctx.unknown(key, writable_members(info, scope));
        }
    }

    if !ctx.is_halted() {
        check_required(ctx, info, map, variant, scope);
    }

    (ctx.issue_count() == before).then_some(out)
}

pub(crate) fn update_input<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
    scope: WriteScope<'_>,
) -> Option<UpdateInput> {
    let map = ctx.object(input, &format!("{} update object", info.name()))?;
    let before = ctx.issue_count();
    let variant = variant(ctx, info, map, scope)?;
    let mut out = UpdateInput {
        variant,
        ..UpdateInput::default()
    };

    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        if let Some(model) = info.field(key) {
            if !check_writable(ctx, info, key, scope) {
                continue;
            }
            if let Some(update) = ctx.at(key, |ctx| field::update(ctx, model, raw)) {
                out.fields.insert(key.clone(), update);
            }
        } else if let Some(model) = info.relation(key) {
            if !check_relation(ctx, info, key, scope) {
                continue;
            }
            let ops = ctx.at(key, |ctx| relation::write(ctx, model, raw, relation::Mode::Update));
            if let Some(ops) = ops {
                out.relations.insert(key.clone(), ops);
            }
        } else {
            ctx.unknown(key, writable_members(info, scope));
        }
    }

    (ctx.issue_count() == before).then_some(out)
}

// Foreign-key scalars select the unchecked variant.
fn variant(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    map: &BTreeMap<String, Input>,
    scope: WriteScope<'_>,
) -> Option<WriteVariant> {
    let foreign_key = map
        .keys()
        .find(|key| info.foreign_key(key).is_some() && !scope.is_parent_member(info, key));
    let Some(foreign_key) = foreign_key else {
        return Some(WriteVariant::Checked);
    };

    let owning = map.iter().find(|(key, _)| {
        info.relation(key)
            .is_some_and(|relation| relation.is_owning() && !scope.is_parent_member(info, key))
    });
    if let Some((relation, raw)) = owning {
        ctx.at(relation, |ctx| {
            ctx.shape(
                format!("either '{foreign_key}' or '{relation}'"),
                raw,
                format!(
                    "foreign key '{foreign_key}' cannot be combined with relation write '{relation}'"
                ),
            );
            None::<()>
        });
        return None;
    }

    Some(WriteVariant::Unchecked)
}

fn check_writable(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    key: &str,
    scope: WriteScope<'_>,
) -> bool {
    if scope.is_parent_member(info, key) {
        ctx.unsupported(
            key,
            writable_members(info, scope),
            format!("'{key}' is set by the enclosing relation"),
        );
        return false;
    }

    true
}

fn check_relation(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    key: &str,
    scope: WriteScope<'_>,
) -> bool {
    if scope.scalars_only {
        ctx.unsupported(
            key,
            writable_members(info, scope),
            "relation writes are not allowed in batch payloads",
        );
        return false;
    }

    check_writable(ctx, info, key, scope)
}

// Required scalars, plus required owning relations in the checked variant.
fn check_required(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    map: &BTreeMap<String, Input>,
    variant: WriteVariant,
    scope: WriteScope<'_>,
) {
    for field in info.model.fields {
        if !field.is_required()
            || map.contains_key(field.name)
            || scope.is_parent_member(info, field.name)
        {
            continue;
        }
        if variant == WriteVariant::Checked && info.foreign_key(field.name).is_some() {
            continue;
        }
        ctx.at(field.name, |ctx| {
            ctx.missing(field.describe(), format!("'{}' is required", field.name));
            None::<()>
        });
    }

    if variant == WriteVariant::Unchecked || scope.scalars_only {
        return;
    }

    for relation in info.model.relations {
        let required = !relation.is_many()
            && !relation.nullable
            && relation.is_owning()
            && relation
                .fields
                .iter()
                .any(|fk| info.field(fk).is_some_and(|f| f.is_required()));
        if !required
            || map.contains_key(relation.name)
            || scope.is_parent_member(info, relation.name)
        {
            continue;
        }
        ctx.at(relation.name, |ctx| {
            ctx.missing(
                format!("{} relation write", relation.target),
                format!("relation '{}' is required", relation.name),
            );
            None::<()>
        });
    }
}

fn writable_members(info: &SchemaInfo, scope: WriteScope<'_>) -> String {
    let mut names: Vec<&str> = info
        .model
        .fields
        .iter()
        .map(|f| f.name)
        .filter(|name| !scope.is_parent_member(info, name))
        .collect();
    if !scope.scalars_only {
        names.extend(
            info.model
                .relations
                .iter()
                .map(|r| r.name)
                .filter(|name| !scope.is_parent_member(info, name)),
        );
    }

    format!("one of [{}]", names.join(", "))
}
