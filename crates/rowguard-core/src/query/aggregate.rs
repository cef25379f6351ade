//! `aggregate` and `groupBy` argument descriptors.

use crate::{
    filter::{
        AggregateFn, Filter,
        parse::{parse_having, parse_where},
    },
    model::{
        field::{FieldModel, ScalarKind},
        registry::SchemaInfo,
    },
    query::{OrderBy, field_names, order::order_list, skip, take},
    unique::{self, ResolvedKey},
    validate::Context,
    value::Input,
};
use serde::Serialize;
use std::collections::BTreeMap;

const SELECTIONS: [&str; 5] = ["_avg", "_count", "_max", "_min", "_sum"];

///
/// CountSelection
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CountSelection {
    /// `_all`: count rows rather than non-null values.
    pub all: bool,
    pub fields: Vec<String>,
}

///
/// AggregateSelection
///
/// Requested aggregate outputs; empty lists mean "not requested".
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AggregateSelection {
    pub count: Option<CountSelection>,
    pub avg: Vec<String>,
    pub sum: Vec<String>,
    pub min: Vec<String>,
    pub max: Vec<String>,
}

impl AggregateSelection {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count.is_none()
            && self.avg.is_empty()
            && self.sum.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
    }
}

///
/// AggregateArgs
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateArgs {
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub cursor: Option<ResolvedKey>,
    pub take: Option<i64>,
    pub skip: Option<u64>,
    pub select: AggregateSelection,
}

///
/// GroupByArgs
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupByArgs {
    pub by: Vec<String>,
    pub filter: Filter,
    pub having: Option<Filter>,
    pub order_by: Vec<OrderBy>,
    pub take: Option<i64>,
    pub skip: Option<u64>,
    pub select: AggregateSelection,
}

/// Whether `function` may be applied to `field`.
pub(super) fn aggregatable(function: AggregateFn, field: &FieldModel) -> bool {
    match function {
        AggregateFn::Count => true,
        AggregateFn::Avg | AggregateFn::Sum => !field.list && field.kind.is_numeric(),
        AggregateFn::Max | AggregateFn::Min => !field.list && field.kind != ScalarKind::Json,
    }
}

pub(crate) fn parse_aggregate<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<AggregateArgs> {
    let optional = ["cursor", "orderBy", "skip", "take", "where"];
    let known: Vec<&str> = optional.iter().chain(&SELECTIONS).copied().collect();
    let map = ctx.args(input, "aggregate arguments", &[], &known)?;

    let filter = where_filter(ctx, info, map);
    let order_by = match map.get("orderBy") {
        Some(raw) => ctx.at("orderBy", |ctx| order_list(ctx, info, raw, None)),
        None => Some(Vec::new()),
    };
    let cursor = match map.get("cursor") {
        Some(raw) => ctx.at("cursor", |ctx| unique::resolve(ctx, info, raw)).map(Some),
        None => Some(None),
    };
    let (take, skip) = paging(ctx, map);
    let select = selection(ctx, info, map);

    Some(AggregateArgs {
        filter: filter?,
        order_by: order_by?,
        cursor: cursor?,
        take: take?,
        skip: skip?,
        select: select?,
    })
}

pub(crate) fn parse_group_by<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<GroupByArgs> {
    let optional = ["having", "orderBy", "skip", "take", "where"];
    let known: Vec<&str> = optional.iter().chain(&SELECTIONS).copied().collect();
    let map = ctx.args(input, "groupBy arguments", &["by"], &known)?;

    // `by` scopes orderBy and having, so it is read first.
    let by = ctx.at("by", |ctx| {
        let raw = &map["by"];
        if raw.as_list().is_some_and(<[Input]>::is_empty) {
            ctx.invalid("non-empty array of field names", raw, "by needs at least one field");
            return None;
        }
        field_names(ctx, info, raw, |field| !field.list && field.kind != ScalarKind::Json)
    })?;

    let filter = where_filter(ctx, info, map);
    let having = match map.get("having") {
        Some(raw) => ctx
            .at("having", |ctx| {
                let having = parse_having(ctx, info, raw)?;
                grouped_only(ctx, &having, &by)?;
                Some(having)
            })
            .map(Some),
        None => Some(None),
    };
    let order_by = match map.get("orderBy") {
        Some(raw) => ctx.at("orderBy", |ctx| order_list(ctx, info, raw, Some(&by))),
        None => Some(Vec::new()),
    };
    let (take, skip) = paging(ctx, map);
    if (map.contains_key("take") || map.contains_key("skip")) && !map.contains_key("orderBy") {
        ctx.at("orderBy", |ctx| {
            ctx.missing("orderBy", "take and skip in groupBy require orderBy");
            None::<()>
        });
    }
    let select = selection(ctx, info, map);

    if ctx.is_halted() {
        return None;
    }

    Some(GroupByArgs {
        by,
        filter: filter?,
        having: having?,
        order_by: order_by?,
        take: take?,
        skip: skip?,
        select: select?,
    })
}

fn where_filter<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    map: &BTreeMap<String, Input>,
) -> Option<Filter> {
    match map.get("where") {
        Some(raw) => ctx.at("where", |ctx| parse_where(ctx, info, raw)),
        None => Some(Filter::And(Vec::new())),
    }
}

fn paging(
    ctx: &mut Context<'_>,
    map: &BTreeMap<String, Input>,
) -> (Option<Option<i64>>, Option<Option<u64>>) {
    let take = match map.get("take") {
        Some(raw) => take(ctx, raw).map(Some),
        None => Some(None),
    };
    let skip = match map.get("skip") {
        Some(raw) => skip(ctx, raw).map(Some),
        None => Some(None),
    };

    (take, skip)
}

// Plain column filters in having must target grouped columns.
fn grouped_only(ctx: &mut Context<'_>, filter: &Filter, by: &[String]) -> Option<()> {
    let before = ctx.issue_count();
    let mut stack = vec![filter];

    while let Some(node) = stack.pop() {
        match node {
            Filter::And(parts) | Filter::Or(parts) => stack.extend(parts),
            Filter::Not(inner) => stack.push(inner),
            Filter::Field { field, .. } if !by.contains(field) => {
                ctx.unsupported(
                    field,
                    format!("one of [{}]", by.join(", ")),
                    format!("'{field}' must appear in by to be filtered in having"),
                );
            }
            _ => {}
        }
    }

    (ctx.issue_count() == before).then_some(())
}

fn selection(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    map: &BTreeMap<String, Input>,
) -> Option<AggregateSelection> {
    let mut out = AggregateSelection::default();
    let before = ctx.issue_count();

    for key in SELECTIONS {
        let Some(raw) = map.get(key) else {
            continue;
        };
        let Some(function) = AggregateFn::from_key(key) else {
            continue;
        };
        ctx.at(key, |ctx| {
            if function == AggregateFn::Count {
                out.count = count_selection(ctx, info, raw);
                return None::<()>;
            }
            let fields = selected_fields(ctx, info, function, raw, false)?;
            match function {
                AggregateFn::Avg => out.avg = fields,
                AggregateFn::Max => out.max = fields,
                AggregateFn::Min => out.min = fields,
                AggregateFn::Sum => out.sum = fields,
                AggregateFn::Count => {}
            }
            None
        });
    }

    (ctx.issue_count() == before && !ctx.is_halted()).then_some(out)
}

// `_count: true` or `{_all?, field..}`.
fn count_selection(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    raw: &Input,
) -> Option<CountSelection> {
    if let Input::Bool(all) = raw {
        return all.then(|| CountSelection {
            all: true,
            fields: Vec::new(),
        });
    }

    let all = match raw.as_object().and_then(|map| map.get("_all")) {
        None => false,
        Some(Input::Bool(all)) => *all,
        Some(other) => {
            ctx.at("_all", |ctx| {
                ctx.invalid("boolean", other, "_all takes true or false");
                None::<()>
            });
            return None;
        }
    };
    let fields = selected_fields(ctx, info, AggregateFn::Count, raw, true)?;

    (all || !fields.is_empty()).then_some(CountSelection { all, fields })
}

// `{field: true}`; false entries are dropped.
fn selected_fields(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    function: AggregateFn,
    raw: &Input,
    allow_all: bool,
) -> Option<Vec<String>> {
    let map = ctx.object(raw, "object of field: boolean")?;
    let before = ctx.issue_count();
    let mut out = Vec::new();

    for (key, value) in map {
        if allow_all && key == "_all" {
            continue;
        }
        let Some(field) = info.field(key) else {
            let accepted: Vec<&str> = info
                .model
                .fields
                .iter()
                .filter(|field| aggregatable(function, field))
                .map(|field| field.name)
                .collect();
            ctx.unknown(key, format!("one of [{}]", accepted.join(", ")));
            continue;
        };
        if !aggregatable(function, field) {
            ctx.unsupported(
                key,
                "a field the aggregate applies to",
                format!("{} cannot be applied to '{key}' ({})", function.key(), field.describe()),
            );
            continue;
        }
        match value {
            Input::Bool(true) => out.push(field.name.to_string()),
            Input::Bool(false) => {}
            other => {
                ctx.at(key, |ctx| {
                    ctx.invalid("boolean", other, "aggregate selections take true or false");
                    None::<()>
                });
            }
        }
    }

    (ctx.issue_count() == before).then_some(out)
}
