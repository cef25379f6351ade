//! Static schema of the multi-tenant SaaS data model.
//!
//! Identity (users, OAuth accounts, sessions, verification tokens),
//! tenancy (organizations, memberships), billing (subscriptions, invoices),
//! the blog (posts, comments) and AI chat transcripts (chats, messages).
//! Everything here is data; validation lives in `rowguard-core`.

use rowguard_core::{
    config::ValidatorConfig,
    model::RegistryError,
    prelude::*,
};
use std::sync::LazyLock;

///
/// ENUMS
///

pub static ROLE: EnumModel = EnumModel::new("Role", &["ADMIN", "USER"]);

pub static MEMBERSHIP_ROLE: EnumModel =
    EnumModel::new("MembershipRole", &["ADMIN", "MEMBER", "OWNER"]);

pub static SUBSCRIPTION_STATUS: EnumModel = EnumModel::new(
    "SubscriptionStatus",
    &["ACTIVE", "CANCELED", "INCOMPLETE", "PAST_DUE", "TRIALING"],
);

pub static INVOICE_STATUS: EnumModel =
    EnumModel::new("InvoiceStatus", &["DRAFT", "OPEN", "PAID", "UNCOLLECTIBLE", "VOID"]);

pub static MESSAGE_ROLE: EnumModel =
    EnumModel::new("MessageRole", &["ASSISTANT", "SYSTEM", "TOOL", "USER"]);

///
/// IDENTITY
///

pub static USER: EntityModel = EntityModel {
    name: "User",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("email", ScalarKind::Text),
        FieldModel::new("name", ScalarKind::Text).nullable(),
        FieldModel::new("image", ScalarKind::Text).nullable(),
        FieldModel::new("emailVerified", ScalarKind::DateTime).nullable(),
        FieldModel::new("role", ScalarKind::Enum(&ROLE)).with_default(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
        FieldModel::new("updatedAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::many("accounts", "Account").inverse("user"),
        RelationModel::many("sessions", "Session").inverse("user"),
        RelationModel::many("memberships", "Membership").inverse("user"),
        RelationModel::many("posts", "Post").inverse("author"),
        RelationModel::many("comments", "Comment").inverse("author"),
        RelationModel::many("chats", "Chat").inverse("user"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"]), UniqueModel::new(&["email"])],
};

/// OAuth provider account linked to a user.
pub static ACCOUNT: EntityModel = EntityModel {
    name: "Account",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("userId", ScalarKind::Text),
        FieldModel::new("type", ScalarKind::Text),
        FieldModel::new("provider", ScalarKind::Text),
        FieldModel::new("providerAccountId", ScalarKind::Text),
        FieldModel::new("refresh_token", ScalarKind::Text).nullable(),
        FieldModel::new("access_token", ScalarKind::Text).nullable(),
        FieldModel::new("expires_at", ScalarKind::Int).nullable(),
        FieldModel::new("token_type", ScalarKind::Text).nullable(),
        FieldModel::new("scope", ScalarKind::Text).nullable(),
        FieldModel::new("id_token", ScalarKind::Text).nullable(),
        FieldModel::new("session_state", ScalarKind::Text).nullable(),
    ],
    relations: &[RelationModel::one("user", "User")
        .owning(&["userId"], &["id"])
        .inverse("accounts")],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["provider", "providerAccountId"]),
    ],
};

pub static SESSION: EntityModel = EntityModel {
    name: "Session",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("sessionToken", ScalarKind::Text),
        FieldModel::new("userId", ScalarKind::Text),
        FieldModel::new("expires", ScalarKind::DateTime),
    ],
    relations: &[RelationModel::one("user", "User")
        .owning(&["userId"], &["id"])
        .inverse("sessions")],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["sessionToken"]),
    ],
};

pub static VERIFICATION_TOKEN: EntityModel = EntityModel {
    name: "VerificationToken",
    fields: &[
        FieldModel::new("identifier", ScalarKind::Text),
        FieldModel::new("token", ScalarKind::Text),
        FieldModel::new("expires", ScalarKind::DateTime),
    ],
    relations: &[],
    unique_keys: &[
        UniqueModel::primary(&["token"]),
        UniqueModel::new(&["identifier", "token"]),
    ],
};

///
/// TENANCY
///

pub static ORGANIZATION: EntityModel = EntityModel {
    name: "Organization",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("name", ScalarKind::Text),
        FieldModel::new("slug", ScalarKind::Text),
        FieldModel::new("settings", ScalarKind::Json).with_default(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::many("memberships", "Membership").inverse("organization"),
        RelationModel::one("subscription", "Subscription")
            .nullable()
            .inverse("organization"),
        RelationModel::many("invoices", "Invoice").inverse("organization"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"]), UniqueModel::new(&["slug"])],
};

pub static MEMBERSHIP: EntityModel = EntityModel {
    name: "Membership",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("organizationId", ScalarKind::Text),
        FieldModel::new("userId", ScalarKind::Text),
        FieldModel::new("role", ScalarKind::Enum(&MEMBERSHIP_ROLE)).with_default(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::one("organization", "Organization")
            .owning(&["organizationId"], &["id"])
            .inverse("memberships"),
        RelationModel::one("user", "User")
            .owning(&["userId"], &["id"])
            .inverse("memberships"),
    ],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["organizationId", "userId"]),
    ],
};

///
/// BILLING
///

pub static SUBSCRIPTION: EntityModel = EntityModel {
    name: "Subscription",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("organizationId", ScalarKind::Text),
        FieldModel::new("stripeSubscriptionId", ScalarKind::Text),
        FieldModel::new("status", ScalarKind::Enum(&SUBSCRIPTION_STATUS)),
        FieldModel::new("priceId", ScalarKind::Text),
        FieldModel::new("quantity", ScalarKind::Int).with_default(),
        FieldModel::new("currentPeriodEnd", ScalarKind::DateTime),
        FieldModel::new("cancelAtPeriodEnd", ScalarKind::Bool).with_default(),
    ],
    relations: &[RelationModel::one("organization", "Organization")
        .owning(&["organizationId"], &["id"])
        .inverse("subscription")],
    unique_keys: &[
        UniqueModel::primary(&["id"]),
        UniqueModel::new(&["organizationId"]),
        UniqueModel::new(&["stripeSubscriptionId"]),
    ],
};

pub static INVOICE: EntityModel = EntityModel {
    name: "Invoice",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("organizationId", ScalarKind::Text),
        FieldModel::new("number", ScalarKind::Text),
        FieldModel::new("amountDue", ScalarKind::Decimal),
        FieldModel::new("amountPaid", ScalarKind::Decimal).with_default(),
        FieldModel::new("currency", ScalarKind::Text).with_default(),
        FieldModel::new("status", ScalarKind::Enum(&INVOICE_STATUS)),
        FieldModel::new("lineItems", ScalarKind::Json).with_default(),
        FieldModel::new("issuedAt", ScalarKind::DateTime).with_default(),
        FieldModel::new("paidAt", ScalarKind::DateTime).nullable(),
    ],
    relations: &[RelationModel::one("organization", "Organization")
        .owning(&["organizationId"], &["id"])
        .inverse("invoices")],
    unique_keys: &[UniqueModel::primary(&["id"]), UniqueModel::new(&["number"])],
};

///
/// BLOG
///

pub static POST: EntityModel = EntityModel {
    name: "Post",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("title", ScalarKind::Text),
        FieldModel::new("slug", ScalarKind::Text),
        FieldModel::new("content", ScalarKind::Text).nullable(),
        FieldModel::new("published", ScalarKind::Bool).with_default(),
        FieldModel::new("tags", ScalarKind::Text).list(),
        FieldModel::new("metadata", ScalarKind::Json).nullable(),
        FieldModel::new("viewCount", ScalarKind::BigInt).with_default(),
        FieldModel::new("authorId", ScalarKind::Text),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
        FieldModel::new("updatedAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::one("author", "User")
            .owning(&["authorId"], &["id"])
            .inverse("posts"),
        RelationModel::many("comments", "Comment").inverse("post"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"]), UniqueModel::new(&["slug"])],
};

/// Threaded comment; `parent` points at the comment being replied to.
pub static COMMENT: EntityModel = EntityModel {
    name: "Comment",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("content", ScalarKind::Text),
        FieldModel::new("postId", ScalarKind::Text),
        FieldModel::new("authorId", ScalarKind::Text),
        FieldModel::new("parentId", ScalarKind::Text).nullable(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::one("post", "Post")
            .owning(&["postId"], &["id"])
            .inverse("comments"),
        RelationModel::one("author", "User")
            .owning(&["authorId"], &["id"])
            .inverse("comments"),
        RelationModel::one("parent", "Comment")
            .nullable()
            .owning(&["parentId"], &["id"])
            .inverse("replies"),
        RelationModel::many("replies", "Comment").inverse("parent"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

///
/// AI CHAT
///

pub static CHAT: EntityModel = EntityModel {
    name: "Chat",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("title", ScalarKind::Text).nullable(),
        FieldModel::new("model", ScalarKind::Text).with_default(),
        FieldModel::new("temperature", ScalarKind::Float).nullable(),
        FieldModel::new("userId", ScalarKind::Text),
        FieldModel::new("metadata", ScalarKind::Json).nullable(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[
        RelationModel::one("user", "User")
            .owning(&["userId"], &["id"])
            .inverse("chats"),
        RelationModel::many("messages", "Message").inverse("chat"),
    ],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

pub static MESSAGE: EntityModel = EntityModel {
    name: "Message",
    fields: &[
        FieldModel::new("id", ScalarKind::Text).with_default(),
        FieldModel::new("chatId", ScalarKind::Text),
        FieldModel::new("role", ScalarKind::Enum(&MESSAGE_ROLE)),
        FieldModel::new("content", ScalarKind::Text),
        FieldModel::new("tokenCount", ScalarKind::Int).nullable(),
        FieldModel::new("toolCalls", ScalarKind::Json).nullable(),
        FieldModel::new("createdAt", ScalarKind::DateTime).with_default(),
    ],
    relations: &[RelationModel::one("chat", "Chat")
        .owning(&["chatId"], &["id"])
        .inverse("messages")],
    unique_keys: &[UniqueModel::primary(&["id"])],
};

/// Every entity of the SaaS model, in declaration order.
pub static ENTITIES: [&EntityModel; 12] = [
    &USER,
    &ACCOUNT,
    &SESSION,
    &VERIFICATION_TOKEN,
    &ORGANIZATION,
    &MEMBERSHIP,
    &SUBSCRIPTION,
    &INVOICE,
    &POST,
    &COMMENT,
    &CHAT,
    &MESSAGE,
];

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    build(ValidatorConfig::default())
        .unwrap_or_else(|err| panic!("saas schema failed to wire: {err}"))
});

/// Wire the SaaS model with a custom validator configuration.
pub fn build(config: ValidatorConfig) -> Result<Registry, RegistryError> {
    Registry::build(&ENTITIES, config)
}

/// Process-wide registry with default configuration.
///
/// # Panics
///
/// On first use, if the static schema contains a wiring error.
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Schema handle for one SaaS entity by name.
#[must_use]
pub fn entity(name: &str) -> Option<Entity<'static>> {
    registry().entity(name)
}
