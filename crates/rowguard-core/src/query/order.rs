use crate::{
    filter::AggregateFn,
    model::{
        field::{FieldModel, ScalarKind},
        registry::SchemaInfo,
        relation::RelationModel,
    },
    query::aggregate::aggregatable,
    validate::Context,
    value::Input,
};
use serde::Serialize;

///
/// SortOrder
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

///
/// NullsOrder
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum NullsOrder {
    First,
    Last,
}

///
/// OrderBy
///
/// One ordering term; a list of terms sorts lexicographically.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum OrderBy {
    /// Aggregate of a grouped column (`groupBy` only).
    Aggregate {
        function: AggregateFn,
        field: String,
        direction: SortOrder,
    },
    Field {
        field: String,
        direction: SortOrder,
        nulls: Option<NullsOrder>,
    },
    /// Order by columns of a to-one related row.
    Relation {
        relation: String,
        order: Vec<Self>,
    },
    /// Order by the number of rows in a to-many relation.
    RelationCount {
        relation: String,
        direction: SortOrder,
    },
}

pub(crate) fn parse_order_by<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<Vec<OrderBy>> {
    order_list(ctx, info, input, None)
}

/// An orderBy object or a list of them. `by` is set inside `groupBy`, where
/// only grouped columns and aggregates may be ordered.
pub(super) fn order_list<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    raw: &Input,
    by: Option<&[String]>,
) -> Option<Vec<OrderBy>> {
    if !matches!(raw, Input::List(_)) {
        return order_entry(ctx, info, raw, by).map(|entry| vec![entry]);
    }

    let items = ctx.list(raw, "array of orderBy objects")?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        out.push(ctx.at(index, |ctx| order_entry(ctx, info, item, by)));
    }

    out.into_iter().collect()
}

fn order_entry<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    raw: &Input,
    by: Option<&[String]>,
) -> Option<OrderBy> {
    let map = ctx.object(raw, "orderBy object")?;
    let mut entries = map.iter();
    let (Some((key, value)), None) = (entries.next(), entries.next()) else {
        ctx.shape(
            "object with exactly one key",
            raw,
            "each orderBy object takes exactly one key; use a list to order by several",
        );
        return None;
    };

    if let Some(field) = info.field(key) {
        if !is_orderable(field) {
            ctx.unsupported(
                key,
                "an orderable scalar field",
                format!("'{key}' is {} and cannot be ordered", field.describe()),
            );
            return None;
        }
        if let Some(by) = by
            && !by.iter().any(|name| name == key)
        {
            ctx.unsupported(
                key,
                format!("one of [{}]", by.join(", ")),
                format!("'{key}' must appear in by to be ordered"),
            );
            return None;
        }
        return ctx.at(key, |ctx| field_order(ctx, field, value));
    }

    if by.is_some()
        && let Some(function) = AggregateFn::from_key(key)
    {
        return ctx.at(key, |ctx| aggregate_order(ctx, info, function, value));
    }

    if by.is_none()
        && let Some(relation) = info.relation(key)
    {
        return ctx.at(key, |ctx| relation_order(ctx, relation, value));
    }

    ctx.unknown(key, orderable_members(info, by));

    None
}

const fn is_orderable(field: &FieldModel) -> bool {
    !field.list && !matches!(field.kind, ScalarKind::Json)
}

fn orderable_members(info: &SchemaInfo, by: Option<&[String]>) -> String {
    let mut names: Vec<String> = match by {
        Some(by) => by.to_vec(),
        None => info
            .model
            .fields
            .iter()
            .filter(|field| is_orderable(field))
            .map(|field| field.name.to_string())
            .collect(),
    };
    match by {
        Some(_) => names.extend(
            ["_avg", "_count", "_max", "_min", "_sum"]
                .iter()
                .map(ToString::to_string),
        ),
        None => names.extend(info.model.relations.iter().map(|r| r.name.to_string())),
    }

    format!("one of [{}]", names.join(", "))
}

fn sort_order(ctx: &mut Context<'_>, raw: &Input) -> Option<SortOrder> {
    match raw.as_str() {
        Some("asc") => Some(SortOrder::Asc),
        Some("desc") => Some(SortOrder::Desc),
        _ => {
            ctx.invalid("\"asc\" | \"desc\"", raw, "unknown sort order");
            None
        }
    }
}

fn nulls_order(ctx: &mut Context<'_>, raw: &Input) -> Option<NullsOrder> {
    match raw.as_str() {
        Some("first") => Some(NullsOrder::First),
        Some("last") => Some(NullsOrder::Last),
        _ => {
            ctx.invalid("\"first\" | \"last\"", raw, "unknown nulls order");
            None
        }
    }
}

// `"asc"` or `{sort, nulls?}`
fn field_order(ctx: &mut Context<'_>, field: &FieldModel, raw: &Input) -> Option<OrderBy> {
    if !matches!(raw, Input::Object(_)) {
        return sort_order(ctx, raw).map(|direction| OrderBy::Field {
            field: field.name.to_string(),
            direction,
            nulls: None,
        });
    }

    let map = ctx.args(raw, "{sort, nulls?}", &["sort"], &["nulls"])?;
    let direction = ctx.at("sort", |ctx| sort_order(ctx, &map["sort"]));
    let nulls = match map.get("nulls") {
        None => Some(None),
        Some(_) if !field.nullable => {
            ctx.unsupported(
                "nulls",
                "one of [sort]",
                format!("nulls ordering requires a nullable field, '{}' is required", field.name),
            );
            None
        }
        Some(raw) => ctx.at("nulls", |ctx| nulls_order(ctx, raw)).map(Some),
    };

    Some(OrderBy::Field {
        field: field.name.to_string(),
        direction: direction?,
        nulls: nulls?,
    })
}

fn relation_order<'r>(
    ctx: &mut Context<'r>,
    relation: &RelationModel,
    raw: &Input,
) -> Option<OrderBy> {
    let target = ctx.target(relation)?;

    if relation.is_many() {
        let map = ctx.args(raw, "{_count: asc | desc}", &["_count"], &[])?;
        let direction = ctx.at("_count", |ctx| sort_order(ctx, &map["_count"]))?;
        return Some(OrderBy::RelationCount {
            relation: relation.name.to_string(),
            direction,
        });
    }
    if matches!(raw, Input::List(_)) {
        ctx.cardinality(
            format!("{} orderBy object", target.name()),
            raw,
            format!("'{}' is a to-one relation", relation.name),
        );
        return None;
    }

    let entry = order_entry(ctx, target, raw, None)?;

    Some(OrderBy::Relation {
        relation: relation.name.to_string(),
        order: vec![entry],
    })
}

// `{_avg: {field: asc}}`
fn aggregate_order(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    function: AggregateFn,
    raw: &Input,
) -> Option<OrderBy> {
    let map = ctx.object(raw, "{field: asc | desc}")?;
    let mut entries = map.iter();
    let (Some((key, value)), None) = (entries.next(), entries.next()) else {
        ctx.shape(
            "object with exactly one key",
            raw,
            "aggregate orderings take exactly one field",
        );
        return None;
    };

    let Some(field) = info.field(key) else {
        ctx.unknown(key, format!("a field of {}", info.name()));
        return None;
    };
    if !aggregatable(function, field) {
        ctx.unsupported(
            key,
            "a field the aggregate applies to",
            format!("{} cannot be applied to '{key}' ({})", function.key(), field.describe()),
        );
        return None;
    }

    let direction = ctx.at(key, |ctx| sort_order(ctx, value))?;

    Some(OrderBy::Aggregate {
        function,
        field: field.name.to_string(),
        direction,
    })
}
