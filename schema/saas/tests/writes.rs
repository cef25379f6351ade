//! Mutation payloads over the SaaS relation graph.

use rowguard_core::{
    error::IssueKind,
    mutation::{FieldUpdate, RelationOp, Selector, WriteVariant},
    prelude::*,
};
use rowguard_schema_saas::entity;
use serde_json::json;

fn saas(name: &str) -> Entity<'static> {
    entity(name).unwrap_or_else(|| panic!("saas entity '{name}'"))
}

fn input(value: serde_json::Value) -> Input {
    Input::from(value)
}

#[test]
fn signup_creates_user_with_oauth_account_and_membership() {
    let created = saas("User")
        .parse_create(&input(json!({
            "email": "ada@example.com",
            "name": "Ada",
            "accounts": {
                "create": {
                    "type": "oauth",
                    "provider": "github",
                    "providerAccountId": "42",
                    "expires_at": 1_700_000_000
                }
            },
            "memberships": {
                "create": [{
                    "role": "OWNER",
                    "organization": {"create": {"name": "Acme", "slug": "acme"}}
                }]
            }
        })))
        .expect("signup payload");

    assert_eq!(created.variant, WriteVariant::Checked);
    assert!(matches!(
        created.relations["accounts"].as_slice(),
        [RelationOp::Create(accounts)] if accounts.len() == 1
    ));
    let [RelationOp::Create(memberships)] = created.relations["memberships"].as_slice() else {
        panic!("expected one membership create");
    };
    assert_eq!(
        memberships[0].fields.get("role"),
        Some(&Value::Enum("OWNER".into()))
    );
    assert!(memberships[0].relations.contains_key("organization"));
}

#[test]
fn nested_account_cannot_name_its_parent() {
    let err = saas("User")
        .parse_create(&input(json!({
            "email": "ada@example.com",
            "accounts": {
                "create": {
                    "type": "oauth",
                    "provider": "github",
                    "providerAccountId": "42",
                    "userId": "someone-else"
                }
            }
        })))
        .expect_err("parent foreign key in nested create");

    assert!(
        err.at("accounts.create.userId")
            .any(|issue| issue.kind == IssueKind::UnknownField)
    );
}

#[test]
fn oauth_account_connects_by_compound_key() {
    let flat = saas("Session")
        .parse_create(&input(json!({
            "sessionToken": "tok",
            "expires": "2030-01-01",
            "user": {"connect": {"email": "ada@example.com"}}
        })))
        .expect("connect by email");
    assert!(matches!(
        flat.relations["user"].as_slice(),
        [RelationOp::Connect(keys)] if keys[0].value("email").is_some()
    ));

    let account = saas("Account");
    let nested = account
        .resolve_unique(&input(json!({
            "provider_providerAccountId": {"provider": "github", "providerAccountId": "42"}
        })))
        .expect("nested compound");
    let flat = account
        .resolve_unique(&input(json!({"provider": "github", "providerAccountId": "42"})))
        .expect("flat compound");
    assert_eq!(nested, flat);
}

#[test]
fn subscription_update_disconnects_nothing_required() {
    let organization = saas("Organization");

    let cancel = organization
        .parse_update(&input(json!({
            "subscription": {"update": {"cancelAtPeriodEnd": true, "quantity": {"increment": 2}}}
        })))
        .expect("nested to-one update");
    let [RelationOp::Update(updates)] = cancel.relations["subscription"].as_slice() else {
        panic!("expected one update");
    };
    assert_eq!(updates[0].selector, Selector::Current);
    assert_eq!(
        updates[0].data.fields["quantity"],
        FieldUpdate::Increment(Value::Int(2))
    );

    let detach = organization
        .parse_update(&input(json!({"subscription": {"disconnect": true}})))
        .expect("optional relation");
    assert!(detach.relations.contains_key("subscription"));

    let err = saas("Subscription")
        .parse_update(&input(json!({"organization": {"disconnect": true}})))
        .expect_err("required relation");
    assert!(err.has_kind(IssueKind::UnknownField));
}

#[test]
fn invoice_batch_and_bulk_updates() {
    let invoice = saas("Invoice");

    let batch = invoice
        .parse_create_many(&input(json!({
            "data": [
                {"organizationId": "o1", "number": "1", "amountDue": "10", "status": "DRAFT"},
                {"organizationId": "o1", "number": "2", "amountDue": 20.25, "status": "OPEN",
                 "lineItems": [{"sku": "seat", "qty": 3}]}
            ],
            "skipDuplicates": true
        })))
        .expect("createMany");
    assert_eq!(batch.data.len(), 2);
    assert!(batch.data.iter().all(|row| row.variant == WriteVariant::Unchecked));

    let bulk = invoice
        .parse_update_many(&input(json!({
            "where": {"status": "OPEN", "amountDue": {"gte": "100"}},
            "data": {"status": "UNCOLLECTIBLE"}
        })))
        .expect("updateMany");
    assert_eq!(
        bulk.data.fields["status"],
        FieldUpdate::Set(Value::Enum("UNCOLLECTIBLE".into()))
    );

    let err = invoice
        .parse_update(&input(json!({"status": "REFUNDED"})))
        .expect_err("unknown enum variant");
    assert!(err.at("status").any(|issue| issue.kind == IssueKind::FieldValidation));
}

#[test]
fn chat_messages_accept_json_tool_calls() {
    let created = saas("Chat")
        .parse_create(&input(json!({
            "user": {"connect": {"id": "u1"}},
            "temperature": 0.7,
            "metadata": "DbNull",
            "messages": {
                "createMany": {
                    "data": [
                        {"role": "USER", "content": "hi"},
                        {"role": "TOOL", "content": "{}", "toolCalls": [{"name": "search"}]}
                    ]
                }
            }
        })))
        .expect("chat with messages");

    assert_eq!(created.fields.get("metadata"), Some(&Value::Null));
    assert!(matches!(
        created.relations["messages"].as_slice(),
        [RelationOp::CreateMany(args)] if args.data.len() == 2
    ));

    let err = saas("Message")
        .parse_create(&input(json!({
            "chatId": "c1",
            "role": "USER",
            "content": "hi",
            "toolCalls": null
        })))
        .expect_err("top-level null on json column");
    assert!(err.at("toolCalls").any(|issue| issue.kind == IssueKind::FieldValidation));
}
