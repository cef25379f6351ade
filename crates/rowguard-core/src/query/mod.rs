//! Module: query
//! Responsibility: ordering, paging and aggregation descriptors for reads.
//! Does not own: executing reads or the filter grammar itself.
//!
//! Every type here is a validated description handed to the storage
//! collaborator; nothing in this module touches rows.

mod aggregate;
mod find;
mod order;

#[cfg(test)]
mod tests;

pub use aggregate::{AggregateArgs, AggregateSelection, CountSelection, GroupByArgs};
pub use find::FindArgs;
pub use order::{NullsOrder, OrderBy, SortOrder};

pub(crate) use aggregate::{parse_aggregate, parse_group_by};
pub(crate) use find::parse_find_many;
pub(crate) use order::parse_order_by;

use crate::{
    error::{IssueKind, Received},
    model::{field::FieldModel, registry::SchemaInfo},
    validate::{Context, scalar},
    value::Input,
};

/// `take`: any whole number; negative takes page backwards from the cursor.
fn take(ctx: &mut Context<'_>, raw: &Input) -> Option<i64> {
    ctx.at("take", |ctx| match raw {
        Input::Number(n) => {
            let value = scalar::whole_number(n);
            if value.is_none() {
                ctx.invalid("integer", raw, "take must be a whole number");
            }
            value
        }
        _ => {
            ctx.invalid("integer", raw, "take must be a whole number");
            None
        }
    })
}

/// `skip`: non-negative whole number.
fn skip(ctx: &mut Context<'_>, raw: &Input) -> Option<u64> {
    ctx.at("skip", |ctx| {
        let value = match raw {
            Input::Number(n) => scalar::whole_number(n).and_then(|n| u64::try_from(n).ok()),
            _ => None,
        };
        if value.is_none() {
            ctx.invalid("non-negative integer", raw, "skip must be a non-negative whole number");
        }
        value
    })
}

/// Scalar field names: a single name or a list of names.
fn field_names(
    ctx: &mut Context<'_>,
    info: &SchemaInfo,
    raw: &Input,
    accept: impl Fn(&FieldModel) -> bool,
) -> Option<Vec<String>> {
    let items: Vec<&Input> = match raw {
        Input::List(_) => ctx.list(raw, "array of field names")?.iter().collect(),
        other => vec![other],
    };
    let before = ctx.issue_count();
    let mut out = Vec::with_capacity(items.len());

    let expected = format!(
        "one of [{}]",
        info.model
            .fields
            .iter()
            .filter(|f| accept(f))
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    let multiple = matches!(raw, Input::List(_));
    for (index, item) in items.into_iter().enumerate() {
        let check = |ctx: &mut Context<'_>| {
            let field = item.as_str().and_then(|name| info.field(name));
            match field {
                Some(field) if accept(field) => Some(field.name.to_string()),
                _ => {
                    ctx.issue(
                        IssueKind::UnknownField,
                        expected.clone(),
                        Received::Value(item.to_json()),
                        "not a selectable scalar field",
                    );
                    None
                }
            }
        };
        let name = if multiple { ctx.at(index, check) } else { check(ctx) };
        out.extend(name);
    }

    (ctx.issue_count() == before).then_some(out)
}
