use crate::{
    error::IssueKind,
    test_support::{entity, input},
    value::Value,
};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn primary_key_alone_resolves() {
    let key = entity("User")
        .resolve_unique(&input(json!({"id": "u1"})))
        .expect("primary key");

    assert_eq!(key.sets.len(), 1);
    assert!(key.sets[0].primary);
    assert_eq!(key.value("id"), Some(&Value::Text("u1".into())));
}

#[test]
fn compound_key_resolves_flat_or_nested() {
    let user = entity("User");
    let flat = user
        .resolve_unique(&input(json!({"email": "a@x.io", "username": "a"})))
        .expect("flat compound");
    let nested = user
        .resolve_unique(&input(
            json!({"email_username": {"email": "a@x.io", "username": "a"}}),
        ))
        .expect("nested compound");

    assert_eq!(flat, nested);
    assert_eq!(flat.preferred().map(|set| set.name.as_str()), Some("email_username"));
}

#[test]
fn overlapping_sets_are_all_honored() {
    let key = entity("User")
        .resolve_unique(&input(
            json!({"id": "u1", "email": "a@x.io", "username": "a"}),
        ))
        .expect("both sets");

    let names: Vec<_> = key.sets.iter().map(|set| set.name.as_str()).collect();
    assert_eq!(names, ["id", "email_username"]);
}

#[test]
fn empty_input_names_every_attempted_set() {
    let err = entity("User")
        .resolve_unique(&input(json!({})))
        .expect_err("nothing supplied");

    assert_eq!(err.issues.len(), 1);
    let issue = &err.issues[0];
    assert_eq!(issue.kind, IssueKind::UnresolvedUniqueKey);
    assert_eq!(issue.expected, "{id} | {email, username}");
}

#[test]
fn partial_compound_key_is_unresolved() {
    let err = entity("User")
        .resolve_unique(&input(json!({"email": "a@x.io"})))
        .expect_err("half a compound key");

    assert!(err.has_kind(IssueKind::UnresolvedUniqueKey));
}

#[test]
fn null_and_foreign_fields_are_rejected() {
    let user = entity("User");

    let null = user
        .resolve_unique(&input(json!({"id": null})))
        .expect_err("null key");
    assert_eq!(null.at("id").count(), 1);
    assert!(null.has_kind(IssueKind::FieldValidation));

    let stray = user
        .resolve_unique(&input(json!({"id": "u1", "name": "Ann"})))
        .expect_err("non-key field");
    assert_eq!(stray.at("name").next().map(|i| i.kind), Some(IssueKind::UnknownField));
}

#[test]
fn nested_compound_requires_every_member() {
    let err = entity("User")
        .resolve_unique(&input(json!({"email_username": {"email": "a@x.io"}})))
        .expect_err("missing member");

    assert_eq!(err.at("email_username.username").count(), 1);
}

#[test]
fn conflicting_flat_and_nested_values_are_a_shape_error() {
    let err = entity("User")
        .resolve_unique(&input(json!({
            "email": "a@x.io",
            "email_username": {"email": "b@x.io", "username": "a"}
        })))
        .expect_err("conflict");

    assert!(err.has_kind(IssueKind::Shape));
}

proptest! {
    #[test]
    fn resolved_keys_round_trip(
        id in proptest::option::of("[a-z0-9]{1,12}"),
        pair in proptest::option::of(("[a-z]{1,8}@[a-z]{1,5}\\.io", "[a-z]{1,10}")),
    ) {
        prop_assume!(id.is_some() || pair.is_some());

        let mut raw = serde_json::Map::new();
        if let Some(id) = id {
            raw.insert("id".into(), json!(id));
        }
        if let Some((email, username)) = pair {
            raw.insert("email".into(), json!(email));
            raw.insert("username".into(), json!(username));
        }

        let user = entity("User");
        let first = user.resolve_unique(&input(raw.into())).expect("resolves");
        let second = user.resolve_unique(&first.to_input()).expect("re-resolves");

        prop_assert_eq!(first, second);
    }
}
