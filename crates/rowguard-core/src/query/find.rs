use crate::{
    filter::{Filter, parse::parse_where},
    model::{field::ScalarKind, registry::SchemaInfo},
    query::{OrderBy, field_names, order::order_list, skip, take},
    unique::{self, ResolvedKey},
    validate::Context,
    value::Input,
};
use serde::Serialize;

///
/// FindArgs
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FindArgs {
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub cursor: Option<ResolvedKey>,
    pub take: Option<i64>,
    pub skip: Option<u64>,
    pub distinct: Vec<String>,
}

pub(crate) fn parse_find_many<'r>(
    ctx: &mut Context<'r>,
    info: &'r SchemaInfo,
    input: &Input,
) -> Option<FindArgs> {
    let map = ctx.args(
        input,
        "findMany arguments",
        &[],
        &["cursor", "distinct", "orderBy", "skip", "take", "where"],
    )?;

    let filter = match map.get("where") {
        Some(raw) => ctx.at("where", |ctx| parse_where(ctx, info, raw)),
        None => Some(Filter::And(Vec::new())),
    };
    let order_by = match map.get("orderBy") {
        Some(raw) => ctx.at("orderBy", |ctx| order_list(ctx, info, raw, None)),
        None => Some(Vec::new()),
    };
    let cursor = match map.get("cursor") {
        Some(raw) => ctx.at("cursor", |ctx| unique::resolve(ctx, info, raw)).map(Some),
        None => Some(None),
    };
    let take = match map.get("take") {
        Some(raw) => take(ctx, raw).map(Some),
        None => Some(None),
    };
    let skip = match map.get("skip") {
        Some(raw) => skip(ctx, raw).map(Some),
        None => Some(None),
    };
    let distinct = match map.get("distinct") {
        Some(raw) => ctx.at("distinct", |ctx| {
            field_names(ctx, info, raw, |field| field.kind != ScalarKind::Json)
        }),
        None => Some(Vec::new()),
    };

    Some(FindArgs {
        filter: filter?,
        order_by: order_by?,
        cursor: cursor?,
        take: take?,
        skip: skip?,
        distinct: distinct?,
    })
}
