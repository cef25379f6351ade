//! Nested relation operations inside create/update payloads.
//!
//! To-one relations take exactly one operation per write; to-many relations
//! take an operation object or a list of them, applied in order.

use crate::{
    filter::{Filter, parse::parse_where},
    model::{registry::SchemaInfo, relation::RelationModel},
    mutation::{
        CreateInput, CreateManyArgs, UpdateInput, UpdateManyArgs, WriteScope, create_input,
        create_many, update_input, update_many,
    },
    unique::{self, ResolvedKey},
    validate::Context,
    value::Input,
};
use serde::Serialize;
use std::collections::BTreeMap;

const ALL_OPS: [&str; 11] = [
    "connect",
    "connectOrCreate",
    "create",
    "createMany",
    "delete",
    "deleteMany",
    "disconnect",
    "set",
    "update",
    "updateMany",
    "upsert",
];
const TO_MANY_ONLY: [&str; 4] = ["createMany", "deleteMany", "set", "updateMany"];

///
/// Selector
///
/// Which related row(s) a nested operation addresses.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum Selector {
    /// The row currently linked through a to-one relation.
    Current,
    Unique(ResolvedKey),
    Where(Filter),
}

///
/// ConnectOrCreate
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectOrCreate {
    pub key: ResolvedKey,
    pub create: CreateInput,
}

///
/// NestedUpdate
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NestedUpdate {
    pub selector: Selector,
    pub data: UpdateInput,
}

///
/// NestedUpsert
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NestedUpsert {
    pub selector: Selector,
    pub create: CreateInput,
    pub update: UpdateInput,
}

///
/// RelationOp
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum RelationOp {
    Connect(Vec<ResolvedKey>),
    ConnectOrCreate(Vec<ConnectOrCreate>),
    Create(Vec<CreateInput>),
    CreateMany(CreateManyArgs),
    Delete(Vec<Selector>),
    DeleteMany(Vec<Filter>),
    Disconnect(Vec<Selector>),
    /// Replace the whole to-many set.
    Set(Vec<ResolvedKey>),
    Update(Vec<NestedUpdate>),
    UpdateMany(Vec<UpdateManyArgs>),
    Upsert(Vec<NestedUpsert>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Mode {
    Create,
    Update,
}

impl Mode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

fn allowed_ops(relation: &RelationModel, mode: Mode) -> &'static [&'static str] {
    match (mode, relation.is_many(), relation.nullable) {
        (Mode::Create, false, _) => &["connect", "connectOrCreate", "create"],
        (Mode::Create, true, _) => &["connect", "connectOrCreate", "create", "createMany"],
        (Mode::Update, false, false) => {
            &["connect", "connectOrCreate", "create", "update", "upsert"]
        }
        (Mode::Update, false, true) => &[
            "connect",
            "connectOrCreate",
            "create",
            "delete",
            "disconnect",
            "update",
            "upsert",
        ],
        (Mode::Update, true, _) => &ALL_OPS,
    }
}

fn describe_ops(ops: &[&str]) -> String {
    format!("one of [{}]", ops.join(", "))
}

pub(super) fn write<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    raw: &Input,
    mode: Mode,
) -> Option<Vec<RelationOp>> {
    let target = ctx.target(relation)?;
    let allowed = allowed_ops(relation, mode);

    match raw {
        Input::Object(map) if !relation.is_many() && map.len() != 1 => {
            ctx.shape(
                format!("exactly {}", describe_ops(allowed)),
                raw,
                format!("to-one relation '{}' takes a single operation", relation.name),
            );
            None
        }
        Input::Object(map) => operations(ctx, relation, target, map, mode),
        Input::List(_) if relation.is_many() => {
            let items = ctx.list(raw, "array of relation operation objects")?;
            let before = ctx.issue_count();
            let mut out = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let ops = ctx.at(index, |ctx| {
                    let map = ctx.object(item, "relation operation object")?;
                    operations(ctx, relation, target, map, mode)
                });
                out.extend(ops.into_iter().flatten());
            }

            (ctx.issue_count() == before).then_some(out)
        }
        Input::List(_) => {
            ctx.cardinality(
                describe_ops(allowed),
                raw,
                format!("'{}' is a to-one relation", relation.name),
            );
            None
        }
        _ => {
            ctx.shape(
                "relation operation object",
                raw,
                "relation writes take an operation object",
            );
            None
        }
    }
}

fn operations<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    map: &BTreeMap<String, Input>,
    mode: Mode,
) -> Option<Vec<RelationOp>> {
    let allowed = allowed_ops(relation, mode);
    let before = ctx.issue_count();
    let mut out = Vec::with_capacity(map.len());

    for (key, raw) in map {
        if ctx.is_halted() {
            break;
        }
        let key = key.as_str();
        if !ALL_OPS.contains(&key) {
            ctx.unknown(key, describe_ops(allowed));
            continue;
        }
        if !relation.is_many() && TO_MANY_ONLY.contains(&key) {
            ctx.at(key, |ctx| {
                ctx.cardinality(
                    describe_ops(allowed),
                    raw,
                    format!("'{key}' applies to to-many relations only"),
                );
                None::<()>
            });
            continue;
        }
        if !allowed.contains(&key) {
            ctx.unsupported(
                key,
                describe_ops(allowed),
                format!(
                    "'{key}' is not valid in a nested {} of '{}'",
                    mode.as_str(),
                    relation.name
                ),
            );
            continue;
        }

        out.extend(ctx.at(key, |ctx| operation(ctx, relation, target, key, raw)));
    }

    (ctx.issue_count() == before).then_some(out)
}

fn operation<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    key: &str,
    raw: &Input,
) -> Option<RelationOp> {
    let many = relation.is_many();
    let parent = relation.inverse;
    let scope = WriteScope {
        parent,
        scalars_only: false,
    };

    match key {
        "connect" => each(ctx, raw, many, |ctx, item| unique::resolve(ctx, target, item))
            .map(RelationOp::Connect),
        "connectOrCreate" => each(ctx, raw, many, |ctx, item| {
            connect_or_create(ctx, target, item, scope)
        })
        .map(RelationOp::ConnectOrCreate),
        "create" => each(ctx, raw, many, |ctx, item| create_input(ctx, target, item, scope))
            .map(RelationOp::Create),
        "createMany" => create_many(ctx, target, raw, parent).map(RelationOp::CreateMany),
        "delete" => selectors(ctx, relation, target, raw).map(RelationOp::Delete),
        "deleteMany" => each(ctx, raw, true, |ctx, item| parse_where(ctx, target, item))
            .map(RelationOp::DeleteMany),
        "disconnect" => selectors(ctx, relation, target, raw).map(RelationOp::Disconnect),
        "set" => each(ctx, raw, true, |ctx, item| unique::resolve(ctx, target, item))
            .map(RelationOp::Set),
        "update" => nested_update(ctx, relation, target, raw, scope).map(RelationOp::Update),
        "updateMany" => each(ctx, raw, true, |ctx, item| update_many(ctx, target, item, parent))
            .map(RelationOp::UpdateMany),
        _ => each(ctx, raw, many, |ctx, item| {
            nested_upsert(ctx, relation, target, item, scope)
        })
        .map(RelationOp::Upsert),
    }
}

// One operand, or a list of operands where the relation allows many.
fn each<'r, T>(
    ctx: &mut Context<'r>,
    raw: &Input,
    many: bool,
    mut f: impl FnMut(&mut Context<'r>, &Input) -> Option<T>,
) -> Option<Vec<T>> {
    if !matches!(raw, Input::List(_)) {
        return f(ctx, raw).map(|one| vec![one]);
    }
    if !many {
        ctx.cardinality(
            "single object",
            raw,
            "to-one relation operations take a single object",
        );
        return None;
    }

    let items = ctx.list(raw, "array of objects")?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        out.push(ctx.at(index, |ctx| f(ctx, item)));
    }

    out.into_iter().collect()
}

fn connect_or_create<'r>(
    ctx: &mut Context<'r>,
    target: &'r SchemaInfo,
    raw: &Input,
    scope: WriteScope<'_>,
) -> Option<ConnectOrCreate> {
    let map = ctx.args(raw, "connectOrCreate arguments", &["create", "where"], &[])?;
    let key = ctx.at("where", |ctx| unique::resolve(ctx, target, &map["where"]));
    let create = ctx.at("create", |ctx| create_input(ctx, target, &map["create"], scope));

    Some(ConnectOrCreate {
        key: key?,
        create: create?,
    })
}

// to-one: `true` / `false` / filter; to-many: unique key(s)
fn selectors<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    raw: &Input,
) -> Option<Vec<Selector>> {
    if relation.is_many() {
        return each(ctx, raw, true, |ctx, item| {
            unique::resolve(ctx, target, item).map(Selector::Unique)
        });
    }

    match raw {
        Input::Bool(true) => Some(vec![Selector::Current]),
        Input::Bool(false) => Some(Vec::new()),
        Input::Object(_) => {
            parse_where(ctx, target, raw).map(|filter| vec![Selector::Where(filter)])
        }
        _ => {
            ctx.invalid(
                format!("boolean or {} filter", target.name()),
                raw,
                "expected true, false or a filter object",
            );
            None
        }
    }
}

fn nested_update<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    raw: &Input,
    scope: WriteScope<'_>,
) -> Option<Vec<NestedUpdate>> {
    if relation.is_many() {
        return each(ctx, raw, true, |ctx, item| {
            let map = ctx.args(item, "update arguments", &["data", "where"], &[])?;
            let key = ctx.at("where", |ctx| unique::resolve(ctx, target, &map["where"]));
            let data = ctx.at("data", |ctx| update_input(ctx, target, &map["data"], scope));

            Some(NestedUpdate {
                selector: Selector::Unique(key?),
                data: data?,
            })
        });
    }

    // `{where?, data}` wrapper, otherwise the object is the data itself
    let wrapped = raw.as_object().is_some_and(|map| {
        map.contains_key("data") && map.keys().all(|k| k == "data" || k == "where")
    });
    if !wrapped {
        return update_input(ctx, target, raw, scope).map(|data| {
            vec![NestedUpdate {
                selector: Selector::Current,
                data,
            }]
        });
    }

    let map = raw.as_object()?;
    let selector = match map.get("where") {
        Some(filter) => ctx
            .at("where", |ctx| parse_where(ctx, target, filter))
            .map(Selector::Where),
        None => Some(Selector::Current),
    };
    let data = ctx.at("data", |ctx| update_input(ctx, target, &map["data"], scope));

    Some(vec![NestedUpdate {
        selector: selector?,
        data: data?,
    }])
}

fn nested_upsert<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    target: &'r SchemaInfo,
    raw: &Input,
    scope: WriteScope<'_>,
) -> Option<NestedUpsert> {
    let (required, optional): (&[&str], &[&str]) = if relation.is_many() {
        (&["create", "update", "where"], &[])
    } else {
        (&["create", "update"], &["where"])
    };
    let map = ctx.args(raw, "upsert arguments", required, optional)?;

    let selector = match map.get("where") {
        Some(key) if relation.is_many() => ctx
            .at("where", |ctx| unique::resolve(ctx, target, key))
            .map(Selector::Unique),
        Some(filter) => ctx
            .at("where", |ctx| parse_where(ctx, target, filter))
            .map(Selector::Where),
        None => Some(Selector::Current),
    };
    let create = ctx.at("create", |ctx| create_input(ctx, target, &map["create"], scope));
    let update = ctx.at("update", |ctx| update_input(ctx, target, &map["update"], scope));

    Some(NestedUpsert {
        selector: selector?,
        create: create?,
        update: update?,
    })
}
