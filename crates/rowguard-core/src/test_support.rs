//! Shared fixture schema for unit tests.
//!
//! `Account` is a standalone entity; `User`, `Post`, `Comment` and `Profile`
//! form a small relation graph covering to-one, to-many, nullable and
//! compound-key cases.

use crate::{
    config::ValidatorConfig,
    model::{
        entity::EntityModel,
        field::{EnumModel, FieldModel, ScalarKind},
        registry::{Entity, Registry},
        relation::RelationModel,
        unique::UniqueModel,
    },
    value::Input,
};
use std::sync::LazyLock;

pub(crate) static ROLE: EnumModel = EnumModel::new("Role", &["ADMIN", "MEMBER"]);

pub(crate) static ACCOUNT: EntityModel = EntityModel {
    name: "Account",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("balance", ScalarKind::Decimal),
        FieldModel::new("tags", ScalarKind::Text).list(),
        FieldModel::new("meta", ScalarKind::Json).nullable(),
        FieldModel::new("settings", ScalarKind::Json).with_default(),
    ],
    relations: &[],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

pub(crate) static USER: EntityModel = EntityModel {
    name: "User",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("email", ScalarKind::Text),
        FieldModel::new("username", ScalarKind::Text),
        FieldModel::new("name", ScalarKind::Text).nullable(),
        FieldModel::new("age", ScalarKind::Int).nullable(),
        FieldModel::new("role", ScalarKind::Enum(&ROLE)).with_default(),
        FieldModel::new("created_at", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::many("posts", "Post").inverse("author"),
        RelationModel::one("profile", "Profile")
            .nullable()
            .inverse("user"),
    ],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["email", "username"]),
    ],
};

pub(crate) static POST: EntityModel = EntityModel {
    name: "Post",
    fields: &[
        FieldModel::new("id", ScalarKind::Int).with_default(),
        FieldModel::new("title", ScalarKind::Text),
        FieldModel::new("views", ScalarKind::Int).with_default(),
        FieldModel::new("published", ScalarKind::Bool).with_default(),
        FieldModel::new("rating", ScalarKind::Decimal).nullable(),
        FieldModel::new("meta", ScalarKind::Json).nullable(),
        FieldModel::new("labels", ScalarKind::Text).list(),
        FieldModel::new("author_id", ScalarKind::Text),
    ],
    relations: &[
        RelationModel::one("author", "User")
            .owning(&["author_id"], &["id"])
            .inverse("posts"),
        RelationModel::many("comments", "Comment").inverse("post"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

pub(crate) static COMMENT: EntityModel = EntityModel {
    name: "Comment",
    fields: &[
        FieldModel::new("id", ScalarKind::Int).with_default(),
        FieldModel::new("body", ScalarKind::Text),
        FieldModel::new("post_id", ScalarKind::Int),
    ],
    relations: &[RelationModel::one("post", "Post")
        .owning(&["post_id"], &["id"])
        .inverse("comments")],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

pub(crate) static PROFILE: EntityModel = EntityModel {
    name: "Profile",
    fields: &[
        FieldModel::new("id", ScalarKind::Int).with_default(),
        FieldModel::new("bio", ScalarKind::Text).nullable(),
        FieldModel::new("user_id", ScalarKind::Text),
    ],
    relations: &[RelationModel::one("user", "User")
        .owning(&["user_id"], &["id"])
        .inverse("profile")],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["user_id"]),
    ],
};

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    Registry::build(
        &[&ACCOUNT, &USER, &POST, &COMMENT, &PROFILE],
        ValidatorConfig::default(),
    )
    .expect("fixture registry wires cleanly")
});

pub(crate) fn registry() -> &'static Registry {
    &REGISTRY
}

pub(crate) fn entity(name: &str) -> Entity<'static> {
    registry()
        .entity(name)
        .unwrap_or_else(|| panic!("fixture entity '{name}'"))
}

/// Raw input from a `serde_json::json!` literal.
pub(crate) fn input(value: serde_json::Value) -> Input {
    Input::from(value)
}
