use super::*;
use crate::{
    error::{IssueKind, ValidationError},
    filter::{AggregateFn, Filter},
    test_support::{entity, input},
    value::Value,
};
use serde_json::json;

fn kind_at(err: &ValidationError, path: &str) -> Option<IssueKind> {
    err.at(path).next().map(|issue| issue.kind)
}

fn field(name: &str, direction: SortOrder) -> OrderBy {
    OrderBy::Field {
        field: name.to_string(),
        direction,
        nulls: None,
    }
}

///
/// orderBy
///

#[test]
fn order_by_accepts_object_or_list() {
    let post = entity("Post");

    let single = post.parse_order_by(&input(json!({"views": "desc"}))).expect("object");
    assert_eq!(single, vec![field("views", SortOrder::Desc)]);

    let many = post
        .parse_order_by(&input(json!([{"published": "asc"}, {"title": "desc"}])))
        .expect("list");
    assert_eq!(
        many,
        vec![field("published", SortOrder::Asc), field("title", SortOrder::Desc)]
    );
}

#[test]
fn order_by_object_takes_exactly_one_key() {
    let err = entity("Post")
        .parse_order_by(&input(json!({"views": "desc", "title": "asc"})))
        .expect_err("two keys");

    assert!(err.has_kind(IssueKind::Shape));
}

#[test]
fn nulls_ordering_requires_a_nullable_field() {
    let post = entity("Post");

    let rating = post
        .parse_order_by(&input(json!({"rating": {"sort": "asc", "nulls": "last"}})))
        .expect("nullable rating");
    assert_eq!(
        rating,
        vec![OrderBy::Field {
            field: "rating".into(),
            direction: SortOrder::Asc,
            nulls: Some(NullsOrder::Last),
        }]
    );

    let err = post
        .parse_order_by(&input(json!({"title": {"sort": "asc", "nulls": "first"}})))
        .expect_err("required title");
    assert_eq!(kind_at(&err, "title.nulls"), Some(IssueKind::UnknownField));
}

#[test]
fn order_by_rejects_lists_json_and_bad_directions() {
    let post = entity("Post");

    let labels = post
        .parse_order_by(&input(json!({"labels": "asc"})))
        .expect_err("list field");
    assert_eq!(kind_at(&labels, "labels"), Some(IssueKind::UnknownField));

    let meta = post
        .parse_order_by(&input(json!({"meta": "asc"})))
        .expect_err("json field");
    assert_eq!(kind_at(&meta, "meta"), Some(IssueKind::UnknownField));

    let sideways = post
        .parse_order_by(&input(json!({"views": "sideways"})))
        .expect_err("bad direction");
    assert_eq!(kind_at(&sideways, "views"), Some(IssueKind::FieldValidation));
}

#[test]
fn relations_order_by_nested_columns_or_count() {
    let by_author = entity("Post")
        .parse_order_by(&input(json!({"author": {"email": "asc"}})))
        .expect("to-one nests");
    assert_eq!(
        by_author,
        vec![OrderBy::Relation {
            relation: "author".into(),
            order: vec![field("email", SortOrder::Asc)],
        }]
    );

    let by_posts = entity("User")
        .parse_order_by(&input(json!({"posts": {"_count": "desc"}})))
        .expect("to-many counts");
    assert_eq!(
        by_posts,
        vec![OrderBy::RelationCount {
            relation: "posts".into(),
            direction: SortOrder::Desc,
        }]
    );

    let err = entity("User")
        .parse_order_by(&input(json!({"posts": {"title": "asc"}})))
        .expect_err("to-many column");
    assert_eq!(kind_at(&err, "posts.title"), Some(IssueKind::UnknownField));
}

///
/// findMany
///

#[test]
fn find_many_parses_every_argument() {
    let args = entity("Post")
        .parse_find_many(&input(json!({
            "where": {"published": true},
            "orderBy": [{"views": "desc"}],
            "cursor": {"id": 7},
            "take": -10,
            "skip": 1,
            "distinct": ["author_id", "published"]
        })))
        .expect("findMany");

    assert!(matches!(args.filter, Filter::Field { ref field, .. } if field == "published"));
    assert_eq!(args.order_by, vec![field("views", SortOrder::Desc)]);
    assert_eq!(
        args.cursor.as_ref().and_then(|key| key.value("id")),
        Some(&Value::Int(7))
    );
    assert_eq!(args.take, Some(-10));
    assert_eq!(args.skip, Some(1));
    assert_eq!(args.distinct, vec!["author_id", "published"]);
}

#[test]
fn find_many_defaults_to_match_all() {
    let args = entity("Post").parse_find_many(&input(json!({}))).expect("empty");

    assert_eq!(args.filter, Filter::And(Vec::new()));
    assert!(args.order_by.is_empty());
    assert_eq!(args.cursor, None);
    assert_eq!(args.take, None);
}

#[test]
fn find_many_reports_each_bad_argument() {
    let err = entity("Post")
        .parse_find_many(&input(json!({
            "skip": -1,
            "take": 1.5,
            "distinct": "nope",
            "limit": 3
        })))
        .expect_err("bad arguments");

    assert_eq!(kind_at(&err, "limit"), Some(IssueKind::UnknownField));

    // unknown keys short-circuit before the remaining arguments are read
    assert_eq!(err.issues.len(), 1);

    let err = entity("Post")
        .parse_find_many(&input(json!({"skip": -1, "take": 1.5, "distinct": "nope"})))
        .expect_err("bad values");
    assert_eq!(kind_at(&err, "skip"), Some(IssueKind::FieldValidation));
    assert_eq!(kind_at(&err, "take"), Some(IssueKind::FieldValidation));
    assert_eq!(kind_at(&err, "distinct"), Some(IssueKind::UnknownField));
}

#[test]
fn find_many_cursor_must_resolve() {
    let err = entity("User")
        .parse_find_many(&input(json!({"cursor": {"email": "a@x.io"}})))
        .expect_err("partial compound cursor");

    assert!(err.has_kind(IssueKind::UnresolvedUniqueKey));
}

///
/// aggregate
///

#[test]
fn aggregate_selections_follow_field_kinds() {
    let args = entity("Post")
        .parse_aggregate(&input(json!({
            "_count": {"_all": true, "rating": true},
            "_avg": {"views": true, "rating": false},
            "_max": {"title": true}
        })))
        .expect("aggregate");

    assert_eq!(
        args.select.count,
        Some(CountSelection {
            all: true,
            fields: vec!["rating".into()],
        })
    );
    assert_eq!(args.select.avg, vec!["views"]);
    assert_eq!(args.select.max, vec!["title"]);
    assert!(args.select.sum.is_empty());
}

#[test]
fn aggregate_rejects_functions_on_unsuitable_fields() {
    let post = entity("Post");

    let avg = post
        .parse_aggregate(&input(json!({"_avg": {"title": true}})))
        .expect_err("avg of text");
    assert_eq!(kind_at(&avg, "_avg.title"), Some(IssueKind::UnknownField));

    let min = post
        .parse_aggregate(&input(json!({"_min": {"meta": true}})))
        .expect_err("min of json");
    assert_eq!(kind_at(&min, "_min.meta"), Some(IssueKind::UnknownField));
}

#[test]
fn count_true_counts_rows() {
    let args = entity("Account")
        .parse_aggregate(&input(json!({"_count": true})))
        .expect("count");

    assert_eq!(
        args.select.count,
        Some(CountSelection {
            all: true,
            fields: Vec::new(),
        })
    );
}

///
/// groupBy
///

#[test]
fn group_by_scopes_order_and_having_to_grouped_columns() {
    let args = entity("Post")
        .parse_group_by(&input(json!({
            "by": ["author_id"],
            "having": {"views": {"_avg": {"gt": 10}}},
            "orderBy": [{"author_id": "asc"}, {"_sum": {"views": "desc"}}],
            "take": 5,
            "_sum": {"views": true}
        })))
        .expect("groupBy");

    assert_eq!(args.by, vec!["author_id"]);
    assert!(matches!(
        args.having,
        Some(Filter::Aggregate { function: AggregateFn::Avg, .. })
    ));
    assert_eq!(
        args.order_by[1],
        OrderBy::Aggregate {
            function: AggregateFn::Sum,
            field: "views".into(),
            direction: SortOrder::Desc,
        }
    );
    assert_eq!(args.take, Some(5));
    assert_eq!(args.select.sum, vec!["views"]);
}

#[test]
fn group_by_rejects_ungrouped_columns() {
    let post = entity("Post");

    let order = post
        .parse_group_by(&input(json!({"by": "author_id", "orderBy": {"title": "asc"}})))
        .expect_err("order by ungrouped");
    assert_eq!(kind_at(&order, "orderBy.title"), Some(IssueKind::UnknownField));

    let having = post
        .parse_group_by(&input(json!({"by": ["author_id"], "having": {"title": "x"}})))
        .expect_err("having on ungrouped");
    assert_eq!(kind_at(&having, "having.title"), Some(IssueKind::UnknownField));
}

#[test]
fn group_by_needs_fields_and_ordered_paging() {
    let post = entity("Post");

    let empty = post
        .parse_group_by(&input(json!({"by": []})))
        .expect_err("empty by");
    assert_eq!(kind_at(&empty, "by"), Some(IssueKind::FieldValidation));

    let missing = post.parse_group_by(&input(json!({}))).expect_err("no by");
    assert_eq!(kind_at(&missing, "by"), Some(IssueKind::FieldValidation));

    let paging = post
        .parse_group_by(&input(json!({"by": ["published"], "skip": 2})))
        .expect_err("skip without orderBy");
    assert_eq!(kind_at(&paging, "orderBy"), Some(IssueKind::FieldValidation));
}
