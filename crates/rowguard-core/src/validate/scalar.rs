//! Module: validate::scalar
//! Responsibility: validate and normalize one raw scalar.
//! Does not own: operator grammar or nested payload shapes.

use crate::{
    config::ValidatorConfig,
    error::ValidationError,
    model::field::{FieldModel, ScalarKind},
    types::{Decimal, DecimalTriple},
    validate::{Context, json},
    value::{Input, Value},
};
use serde_json::Number;
use time::{
    Date, OffsetDateTime, UtcOffset,
    format_description::well_known::{Iso8601, Rfc3339},
    macros::format_description,
};

// ±100,000,000 days, the ECMAScript date range
const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

/// Validate one raw scalar with default limits.
///
/// Absence and `null` are accepted only when `nullable`; both normalize to
/// `Value::Null`.
pub fn validate_scalar(
    kind: ScalarKind,
    nullable: bool,
    raw: Option<&Input>,
) -> Result<Value, ValidationError> {
    validate_scalar_with(&ValidatorConfig::default(), kind, nullable, raw)
}

pub fn validate_scalar_with(
    config: &ValidatorConfig,
    kind: ScalarKind,
    nullable: bool,
    raw: Option<&Input>,
) -> Result<Value, ValidationError> {
    let mut ctx = Context::detached(config);
    let expected = kind.to_string();

    let value = match raw {
        None if nullable => Some(Value::Null),
        None => {
            ctx.missing(expected, "value is required");
            None
        }
        Some(input) => {
            let mut field = FieldModel::new("value", kind);
            field.nullable = nullable;
            field_value(&mut ctx, &field, input)
        }
    };

    ctx.finish(value)
}

/// Validate a present value for a field, honoring nullability, list-ness
/// and JSON write sentinels.
pub(crate) fn field_value(
    ctx: &mut Context<'_>,
    field: &FieldModel,
    input: &Input,
) -> Option<Value> {
    if field.kind == ScalarKind::Json && !field.list {
        return json::write_value(ctx, field.nullable, input);
    }

    if input.is_null() {
        if field.nullable {
            return Some(Value::Null);
        }
        ctx.invalid(
            field.describe(),
            input,
            format!("'{}' is required and cannot be null", field.name),
        );
        return None;
    }

    if field.list {
        return list_value(ctx, field, input);
    }

    scalar_value(ctx, field.kind, input)
}

fn list_value(ctx: &mut Context<'_>, field: &FieldModel, input: &Input) -> Option<Value> {
    let items = ctx.list(input, &field.describe())?;
    element_values(ctx, field.kind, items).map(Value::List)
}

/// Validate list elements; nulls are never legal inside scalar lists.
pub(crate) fn element_values(
    ctx: &mut Context<'_>,
    kind: ScalarKind,
    items: &[Input],
) -> Option<Vec<Value>> {
    let before = ctx.issue_count();
    let mut out = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let value = ctx.at(index, |ctx| {
            if item.is_null() {
                ctx.invalid(kind.to_string(), item, "list elements cannot be null");
                return None;
            }
            element_value(ctx, kind, item)
        });
        if let Some(value) = value {
            out.push(value);
        }
    }

    (ctx.issue_count() == before).then_some(out)
}

fn element_value(ctx: &mut Context<'_>, kind: ScalarKind, input: &Input) -> Option<Value> {
    if kind == ScalarKind::Json {
        return json::filter_value(ctx, input).map(Value::Json);
    }

    scalar_value(ctx, kind, input)
}

/// Validate a non-null scalar of `kind`.
pub(crate) fn scalar_value(
    ctx: &mut Context<'_>,
    kind: ScalarKind,
    input: &Input,
) -> Option<Value> {
    match kind {
        ScalarKind::BigInt => integer(ctx, kind, input, i64::MIN, i64::MAX),
        ScalarKind::Bool => match input {
            Input::Bool(b) => Some(Value::Bool(*b)),
            _ => mismatch(ctx, kind, input),
        },
        ScalarKind::DateTime => datetime(ctx, input),
        ScalarKind::Decimal => decimal(ctx, input),
        ScalarKind::Enum(model) => match input {
            Input::Text(text) if model.contains(text) => Some(Value::Enum(text.clone())),
            Input::Text(text) => {
                ctx.invalid(
                    model.describe(),
                    input,
                    format!("'{text}' is not a member of enum {}", model.name),
                );
                None
            }
            _ => {
                ctx.invalid(model.describe(), input, format!("expected enum {}", model.name));
                None
            }
        },
        ScalarKind::Float => match input {
            Input::Number(n) => n.as_f64().map(Value::Float).or_else(|| mismatch(ctx, kind, input)),
            _ => mismatch(ctx, kind, input),
        },
        ScalarKind::Int => integer(
            ctx,
            kind,
            input,
            i64::from(i32::MIN),
            i64::from(i32::MAX),
        ),
        ScalarKind::Json => json::write_value(ctx, false, input),
        ScalarKind::Text => match input {
            Input::Text(text) => Some(Value::Text(text.clone())),
            _ => mismatch(ctx, kind, input),
        },
    }
}

fn mismatch<T>(ctx: &mut Context<'_>, kind: ScalarKind, input: &Input) -> Option<T> {
    ctx.invalid(
        kind.to_string(),
        input,
        format!("expected {kind}, received {}", input.shape()),
    );

    None
}

// Integral value of a JSON number, accepting `3.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
pub(crate) fn whole_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    let in_range = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;

    in_range.then_some(f as i64)
}

fn integer(
    ctx: &mut Context<'_>,
    kind: ScalarKind,
    input: &Input,
    min: i64,
    max: i64,
) -> Option<Value> {
    let Input::Number(n) = input else {
        return mismatch(ctx, kind, input);
    };

    match whole_number(n) {
        Some(i) if (min..=max).contains(&i) => Some(Value::Int(i)),
        Some(_) => {
            ctx.invalid(
                format!("{kind} in [{min}, {max}]"),
                input,
                format!("{n} is outside the {kind} range"),
            );
            None
        }
        None => {
            ctx.invalid(kind.to_string(), input, format!("{n} is not a whole number"));
            None
        }
    }
}

fn datetime(ctx: &mut Context<'_>, input: &Input) -> Option<Value> {
    let expected = "ISO-8601 datetime, epoch milliseconds, or date";
    match input {
        Input::Text(text) => match parse_datetime(text) {
            Some(dt) => Some(Value::DateTime(dt)),
            None => {
                ctx.invalid(expected, input, format!("'{text}' is not a valid datetime"));
                None
            }
        },
        Input::Number(n) if ctx.config().datetime.epoch_millis => {
            let dt = whole_number(n)
                .filter(|ms| (-MAX_EPOCH_MILLIS..=MAX_EPOCH_MILLIS).contains(ms))
                .and_then(|ms| {
                    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
                });
            if dt.is_none() {
                ctx.invalid(expected, input, format!("{n} is not a valid epoch timestamp"));
            }
            dt.map(Value::DateTime)
        }
        Input::DateTime(dt) => Some(Value::DateTime(dt.to_offset(UtcOffset::UTC))),
        _ => {
            ctx.invalid(expected, input, format!("expected datetime, received {}", input.shape()));
            None
        }
    }
}

/// Parse RFC 3339, ISO-8601 with offset, or a bare `YYYY-MM-DD` (UTC midnight).
pub(crate) fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
    let parsed = OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
        .ok()
        .or_else(|| {
            Date::parse(text, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|date| date.midnight().assume_utc())
        })?;

    Some(parsed.to_offset(UtcOffset::UTC))
}

fn decimal(ctx: &mut Context<'_>, input: &Input) -> Option<Value> {
    let expected = "decimal number, numeric string, or {d, e, s}";
    let radix = ctx.config().decimal.radix_literals;

    let parsed = match input {
        Input::Number(n) => Decimal::parse_literal(&n.to_string(), false),
        Input::Text(text) => Decimal::parse_literal(text, radix),
        Input::Decimal(d) => Ok(*d),
        Input::Object(_) => return decimal_triple(ctx, input).map(Value::Decimal),
        _ => {
            ctx.invalid(expected, input, format!("expected decimal, received {}", input.shape()));
            return None;
        }
    };

    match parsed {
        Ok(d) => Some(Value::Decimal(d)),
        Err(err) => {
            ctx.invalid(expected, input, err.to_string());
            None
        }
    }
}

// `{d: [u32..], e: int, s: ±1}`
fn decimal_triple(ctx: &mut Context<'_>, input: &Input) -> Option<Decimal> {
    let expected = "{d: number[], e: number, s: 1 | -1}";
    let map = input.as_object()?;

    let words = map.get("d").and_then(Input::as_list).and_then(|items| {
        items
            .iter()
            .map(|item| match item {
                Input::Number(n) => n.as_u64().and_then(|w| u32::try_from(w).ok()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
    });
    let int = |key: &str| match map.get(key) {
        Some(Input::Number(n)) => whole_number(n),
        _ => None,
    };

    let (Some(words), Some(exponent), Some(sign), 3) = (words, int("e"), int("s"), map.len())
    else {
        ctx.invalid(expected, input, "malformed decimal triple");
        return None;
    };

    match DecimalTriple::new(words, exponent, sign).and_then(|t| Decimal::from_triple(&t)) {
        Ok(d) => Some(d),
        Err(err) => {
            ctx.invalid(expected, input, err.to_string());
            None
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::IssueKind, model::field::EnumModel};
    use serde_json::json;

    static ROLE: EnumModel = EnumModel::new("Role", &["ADMIN", "MEMBER"]);

    fn ok(kind: ScalarKind, raw: serde_json::Value) -> Value {
        validate_scalar(kind, false, Some(&Input::from(raw))).expect("valid scalar")
    }

    fn err(kind: ScalarKind, raw: serde_json::Value) -> ValidationError {
        validate_scalar(kind, false, Some(&Input::from(raw))).expect_err("invalid scalar")
    }

    #[test]
    fn int_accepts_whole_numbers_in_range() {
        assert_eq!(ok(ScalarKind::Int, json!(3)), Value::Int(3));
        assert_eq!(ok(ScalarKind::Int, json!(3.0)), Value::Int(3));
        err(ScalarKind::Int, json!(3.5));
        err(ScalarKind::Int, json!(2_147_483_648_i64));
        assert_eq!(
            ok(ScalarKind::BigInt, json!(2_147_483_648_i64)),
            Value::Int(2_147_483_648)
        );
    }

    #[test]
    fn text_and_bool_are_type_checked_only() {
        assert_eq!(ok(ScalarKind::Text, json!("")), Value::Text(String::new()));
        assert_eq!(ok(ScalarKind::Bool, json!(false)), Value::Bool(false));
        err(ScalarKind::Text, json!(1));
        err(ScalarKind::Bool, json!("true"));
    }

    #[test]
    fn datetime_forms_normalize_to_utc() {
        let expected = ok(ScalarKind::DateTime, json!("2024-03-01T10:00:00Z"));

        assert_eq!(ok(ScalarKind::DateTime, json!("2024-03-01T12:00:00+02:00")), expected);
        assert_eq!(ok(ScalarKind::DateTime, json!(1_709_287_200_000_i64)), expected);
        assert_eq!(
            ok(ScalarKind::DateTime, json!("2024-03-01")),
            ok(ScalarKind::DateTime, json!("2024-03-01T00:00:00Z"))
        );
    }

    #[test]
    fn datetime_rejects_invalid_calendar_values() {
        err(ScalarKind::DateTime, json!("2024-02-30T00:00:00Z"));
        err(ScalarKind::DateTime, json!("2023-02-29"));
        err(ScalarKind::DateTime, json!("yesterday"));
    }

    #[test]
    fn epoch_millis_can_be_disabled() {
        let config = ValidatorConfig::from_toml_str("[datetime]\nepoch_millis = false\n")
            .expect("config parses");
        let raw = Input::from(json!(0));

        validate_scalar_with(&config, ScalarKind::DateTime, false, Some(&raw))
            .expect_err("epoch disabled");
    }

    #[test]
    fn decimal_representations_agree() {
        let expected = Value::Decimal(Decimal::new(1250, 2));

        assert_eq!(ok(ScalarKind::Decimal, json!(12.5)), expected);
        assert_eq!(ok(ScalarKind::Decimal, json!("12.50")), expected);
        assert_eq!(ok(ScalarKind::Decimal, json!("1.25e1")), expected);
        assert_eq!(ok(ScalarKind::Decimal, json!("0xc.8")), expected);
        assert_eq!(
            ok(ScalarKind::Decimal, json!({"d": [12, 5_000_000], "e": 1, "s": 1})),
            expected
        );
    }

    #[test]
    fn decimal_rejects_non_finite_and_locale_strings() {
        for raw in ["Infinity", "-Infinity", "NaN", "1,5", "1 000", "12.5.1", ""] {
            let error = err(ScalarKind::Decimal, json!(raw));
            assert_eq!(error.issues.len(), 1, "{raw}");
        }
    }

    #[test]
    fn decimal_rejects_malformed_triples() {
        err(ScalarKind::Decimal, json!({"d": [1], "e": 0}));
        err(ScalarKind::Decimal, json!({"d": [1], "e": 0, "s": 2}));
        err(ScalarKind::Decimal, json!({"d": [0, 1], "e": 0, "s": 1}));
        err(ScalarKind::Decimal, json!({"d": [1], "e": 0, "s": 1, "x": 1}));

        for exponent in [i64::MIN, i64::MAX] {
            let error = err(ScalarKind::Decimal, json!({"d": [1], "e": exponent, "s": 1}));
            assert_eq!(error.issues[0].kind, IssueKind::FieldValidation);
        }
    }

    #[test]
    fn enum_error_names_the_legal_set() {
        assert_eq!(
            ok(ScalarKind::Enum(&ROLE), json!("ADMIN")),
            Value::Enum("ADMIN".to_string())
        );

        let error = err(ScalarKind::Enum(&ROLE), json!("OWNER"));
        assert_eq!(error.issues[0].expected, "one of [ADMIN, MEMBER]");
    }

    #[test]
    fn nullability_covers_null_and_absence() {
        let null = Input::Null;

        validate_scalar(ScalarKind::Text, false, None).expect_err("absent");
        validate_scalar(ScalarKind::Text, false, Some(&null)).expect_err("null");
        assert_eq!(
            validate_scalar(ScalarKind::Text, true, None).expect("absent"),
            Value::Null
        );
        assert_eq!(
            validate_scalar(ScalarKind::Text, true, Some(&null)).expect("null"),
            Value::Null
        );
    }
}
