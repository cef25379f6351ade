use super::*;
use crate::{
    error::{IssueKind, ValidationError},
    test_support::{entity, input},
    validate::Record,
    value::{TextMode, Value},
};
use proptest::prelude::*;
use serde_json::{Value as JsonValue, json};

fn kind_at(err: &ValidationError, path: &str) -> Option<IssueKind> {
    err.at(path).next().map(|issue| issue.kind)
}

fn account(id: &str) -> Record {
    Record::new()
        .with_field("id", id)
        .with_field("balance", Value::Null)
        .with_field("meta", Value::Null)
}

fn matching<'a>(filter: &Filter, rows: &'a [Record]) -> Vec<&'a Value> {
    rows.iter()
        .filter(|row| eval(filter, *row))
        .filter_map(|row| row.field("id"))
        .collect()
}

///
/// PARSE
///

#[test]
fn or_of_equalities_selects_each_listed_row() {
    let filter = entity("Account")
        .parse_where(&input(json!({
            "OR": [{"id": {"equals": "a"}}, {"id": {"equals": "b"}}]
        })))
        .expect("valid filter");
    let rows = [account("a"), account("b"), account("c")];

    assert_eq!(
        matching(&filter, &rows),
        vec![&Value::Text("a".into()), &Value::Text("b".into())]
    );
}

#[test]
fn json_path_string_contains_matches_nested_value() {
    let filter = entity("Account")
        .parse_where(&input(json!({
            "meta": {"path": ["a", "b"], "string_contains": "x"}
        })))
        .expect("valid json filter");

    let hit = account("a").with_field("meta", Value::Json(json!({"a": {"b": "xyz"}})));
    let miss = account("b").with_field("meta", Value::Json(json!({"a": {"b": "abc"}})));
    let unset = account("c");

    assert!(eval(&filter, &hit));
    assert!(!eval(&filter, &miss));
    assert!(!eval(&filter, &unset));
}

#[test]
fn empty_combinators_follow_identity_elements() {
    let account = entity("Account");
    let row = self::account("a");

    let empty = account.parse_where(&input(json!({}))).expect("empty where");
    assert_eq!(empty, Filter::And(Vec::new()));
    assert!(eval(&empty, &row));

    let and = account.parse_where(&input(json!({"AND": []}))).expect("AND []");
    assert!(eval(&and, &row));

    let or = account.parse_where(&input(json!({"OR": []}))).expect("OR []");
    assert_eq!(or, Filter::Or(Vec::new()));
    assert!(!eval(&or, &row));
}

#[test]
fn not_over_a_list_negates_every_member() {
    let filter = entity("Account")
        .parse_where(&input(json!({"NOT": [{"id": "a"}, {"id": "b"}]})))
        .expect("NOT list");

    assert_eq!(
        filter,
        Filter::And(vec![
            Filter::field("id", ScalarFilter::equals("a")).negate(),
            Filter::field("id", ScalarFilter::equals("b")).negate(),
        ])
    );
    let rows = [account("a"), account("b"), account("c")];
    assert_eq!(matching(&filter, &rows), vec![&Value::Text("c".into())]);
}

#[test]
fn text_operators_are_rejected_on_other_kinds() {
    let err = entity("Post")
        .parse_where(&input(json!({"views": {"contains": "1"}, "published": {"gt": true}})))
        .expect_err("text op on int");

    assert_eq!(kind_at(&err, "views.contains"), Some(IssueKind::UnknownField));
    assert_eq!(kind_at(&err, "published.gt"), Some(IssueKind::UnknownField));
}

#[test]
fn misspelled_operators_are_unknown_keys() {
    let post = entity("Post");

    let err = post
        .parse_where(&input(json!({"title": {"contain": "x"}})))
        .expect_err("typo");
    assert_eq!(err.issues.len(), 1);
    assert_eq!(kind_at(&err, "title.contain"), Some(IssueKind::UnknownField));

    let err = post
        .parse_where(&input(json!({"views": {"gt": 1, "lte2": 3}})))
        .expect_err("typo beside a valid operator");
    assert_eq!(err.issues.len(), 1);
    assert_eq!(kind_at(&err, "views.lte2"), Some(IssueKind::UnknownField));
    assert_eq!(err.at("views.gt").count(), 0);

    let err = post
        .parse_where(&input(json!({"title": {"not": {"startWith": "a"}}})))
        .expect_err("typo under not");
    assert_eq!(kind_at(&err, "title.not.startWith"), Some(IssueKind::UnknownField));
}

#[test]
fn decimal_triple_literal_is_not_an_operator_object() {
    let account = entity("Account");

    assert!(
        account
            .parse_where(&input(json!({"balance": {"d": [1], "e": 0, "s": 1}})))
            .is_ok()
    );

    let err = account
        .parse_where(&input(json!({"balance": {"gte": "1", "d": [1]}})))
        .expect_err("operator object with a stray key");
    assert_eq!(kind_at(&err, "balance.d"), Some(IssueKind::UnknownField));
}

#[test]
fn unknown_keys_and_bad_leaves_accumulate() {
    let err = entity("Post")
        .parse_where(&input(json!({"titel": "x", "views": {"gt": "many"}, "rating": {"lt": null}})))
        .expect_err("three problems");

    assert_eq!(err.issues.len(), 3);
    assert_eq!(kind_at(&err, "titel"), Some(IssueKind::UnknownField));
    assert_eq!(kind_at(&err, "views.gt"), Some(IssueKind::FieldValidation));
    assert_eq!(kind_at(&err, "rating.lt"), Some(IssueKind::FieldValidation));
}

#[test]
fn relation_filters_respect_cardinality() {
    let to_many = entity("User")
        .parse_where(&input(json!({"posts": {"title": "x"}})))
        .expect_err("to-many without quantifier");
    assert_eq!(kind_at(&to_many, "posts.title"), Some(IssueKind::RelationCardinality));

    let to_one = entity("Post")
        .parse_where(&input(json!({"author": {"some": {"email": "a"}}})))
        .expect_err("quantifier on to-one");
    assert_eq!(kind_at(&to_one, "author"), Some(IssueKind::RelationCardinality));

    let required = entity("Post")
        .parse_where(&input(json!({"author": null})))
        .expect_err("null on required relation");
    assert_eq!(kind_at(&required, "author"), Some(IssueKind::FieldValidation));
}

#[test]
fn to_one_direct_filter_and_is_wrapper_agree() {
    let post = entity("Post");

    let direct = post
        .parse_where(&input(json!({"author": {"email": "a@x.io"}})))
        .expect("direct");
    let wrapped = post
        .parse_where(&input(json!({"author": {"is": {"email": "a@x.io"}}})))
        .expect("wrapped");

    assert_eq!(direct, wrapped);
}

#[test]
fn aggregate_filters_belong_to_having_on_numeric_fields() {
    let post = entity("Post");

    let having = post
        .parse_having(&input(json!({"views": {"_sum": {"gte": 10}}})))
        .expect("having");
    assert!(matches!(having, Filter::Aggregate { function: AggregateFn::Sum, .. }));

    let text = post
        .parse_having(&input(json!({"title": {"_count": {"gt": 1}}})))
        .expect_err("aggregate on text");
    assert_eq!(kind_at(&text, "title._count"), Some(IssueKind::UnknownField));

    let in_where = post
        .parse_where(&input(json!({"views": {"_avg": {"gt": 1}}})))
        .expect_err("aggregate in where");
    assert_eq!(kind_at(&in_where, "views._avg"), Some(IssueKind::UnknownField));

    let relation = post
        .parse_having(&input(json!({"author": {"email": "a"}})))
        .expect_err("relation in having");
    assert_eq!(kind_at(&relation, "author"), Some(IssueKind::UnknownField));
}

#[test]
fn insensitive_mode_reaches_nested_not() {
    let filter = entity("Post")
        .parse_where(&input(json!({
            "title": {"mode": "insensitive", "not": {"contains": "RUST"}}
        })))
        .expect("mode with not");

    let Filter::Field {
        filter: FieldFilter::Scalar(scalar),
        ..
    } = &filter
    else {
        panic!("expected a scalar field filter");
    };
    assert_eq!(scalar.mode, TextMode::Ci);
    let Some(ScalarCondition::Not(inner)) = scalar.conditions.first() else {
        panic!("expected a not condition");
    };
    assert_eq!(inner.mode, TextMode::Ci);

    let row = Record::new().with_field("title", "learning rust");
    assert!(!eval(&filter, &row));
}

#[test]
fn list_filters_parse_and_evaluate() {
    let filter = entity("Account")
        .parse_where(&input(json!({"tags": {"hasSome": ["red", "blue"], "isEmpty": false}})))
        .expect("list filter");

    let row = account("a").with_field(
        "tags",
        Value::List(vec![Value::Text("blue".into()), Value::Text("green".into())]),
    );
    assert!(eval(&filter, &row));

    let empty = account("b").with_field("tags", Value::List(Vec::new()));
    assert!(!eval(&filter, &empty));
}

///
/// EVAL
///

#[test]
fn comparisons_with_null_are_unknown() {
    let post = entity("Post");
    let row = Record::new().with_field("rating", Value::Null);

    let gt = post.parse_where(&input(json!({"rating": {"gt": 1}}))).expect("gt");
    assert!(!eval(&gt, &row));

    let not_gt = post
        .parse_where(&input(json!({"NOT": {"rating": {"gt": 1}}})))
        .expect("NOT gt");
    assert!(!eval(&not_gt, &row));

    let is_null = post.parse_where(&input(json!({"rating": null}))).expect("is null");
    assert!(eval(&is_null, &row));

    let either = post
        .parse_where(&input(json!({"OR": [{"rating": {"gt": 1}}, {"rating": null}]})))
        .expect("unknown or true");
    assert!(eval(&either, &row));
}

#[test]
fn json_null_sentinels_distinguish_storage_states() {
    let account = entity("Account");
    let unset = self::account("a");
    let json_null = self::account("b").with_field("meta", Value::Json(JsonValue::Null));
    let document = self::account("c").with_field("meta", Value::Json(json!({"k": 1})));

    let db_null = account.parse_where(&input(json!({"meta": "DbNull"}))).expect("DbNull");
    let is_json_null = account
        .parse_where(&input(json!({"meta": {"equals": "JsonNull"}})))
        .expect("JsonNull");
    let any_null = account.parse_where(&input(json!({"meta": "AnyNull"}))).expect("AnyNull");

    assert_eq!(
        [&unset, &json_null, &document].map(|row| eval(&db_null, row)),
        [true, false, false]
    );
    assert_eq!(
        [&unset, &json_null, &document].map(|row| eval(&is_json_null, row)),
        [false, true, false]
    );
    assert_eq!(
        [&unset, &json_null, &document].map(|row| eval(&any_null, row)),
        [true, true, false]
    );
}

#[test]
fn relation_quantifiers_over_loaded_rows() {
    let user = entity("User");
    let post = |published: bool| Record::new().with_field("published", published);

    let none_loaded = Record::new().with_many("posts", Vec::new());
    let mixed = Record::new().with_many("posts", vec![post(true), post(false)]);

    let every = user
        .parse_where(&input(json!({"posts": {"every": {"published": true}}})))
        .expect("every");
    let some = user
        .parse_where(&input(json!({"posts": {"some": {"published": true}}})))
        .expect("some");
    let none = user
        .parse_where(&input(json!({"posts": {"none": {"published": false}}})))
        .expect("none");

    assert!(eval(&every, &none_loaded));
    assert!(!eval(&every, &mixed));
    assert!(!eval(&some, &none_loaded));
    assert!(eval(&some, &mixed));
    assert!(eval(&none, &none_loaded));
    assert!(!eval(&none, &mixed));

    let without_profile = Record::new().with_one("profile", None);
    let absent = user.parse_where(&input(json!({"profile": null}))).expect("is null");
    assert!(eval(&absent, &without_profile));

    // relation not loaded on the row
    assert!(!eval(&some, &Record::new()));
}

///
/// PROPERTIES
///

fn leaf() -> impl Strategy<Value = Filter> {
    prop_oneof![
        Just(Filter::True),
        Just(Filter::False),
        "[abc]".prop_map(|id| Filter::field("id", ScalarFilter::equals(id.as_str()))),
        "[nm]".prop_map(|name| Filter::field("name", ScalarFilter::equals(name.as_str()))),
    ]
}

fn tree() -> impl Strategy<Value = Filter> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Filter::And),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Filter::Or),
            inner.prop_map(Filter::negate),
        ]
    })
}

fn sample_rows() -> Vec<Record> {
    ["a", "b", "c"]
        .into_iter()
        .flat_map(|id| {
            [
                Record::new().with_field("id", id).with_field("name", "n"),
                Record::new().with_field("id", id).with_field("name", Value::Null),
            ]
        })
        .collect()
}

proptest! {
    #[test]
    fn normalize_preserves_evaluation(filter in tree()) {
        let normalized = filter.normalize();

        for row in sample_rows() {
            prop_assert_eq!(eval(&filter, &row), eval(&normalized, &row));
        }
    }

    #[test]
    fn normalize_is_idempotent(filter in tree()) {
        let once = filter.normalize();

        prop_assert_eq!(once.normalize(), once);
    }

    #[test]
    fn not_list_equals_and_of_negations(ids in prop::collection::vec("[abc]", 0..4)) {
        let members: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        let user = entity("User");
        let parsed = user
            .parse_where(&input(json!({"NOT": members})))
            .expect("NOT list");
        let negated_or = Filter::Or(
            ids.iter()
                .map(|id| Filter::field("id", ScalarFilter::equals(id.as_str())))
                .collect(),
        )
        .negate();

        for row in sample_rows() {
            prop_assert_eq!(eval(&parsed, &row), eval(&negated_or, &row));
        }
    }
}
