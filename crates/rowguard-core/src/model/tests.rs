use super::{
    entity::EntityModel,
    field::{EnumModel, FieldModel, ScalarKind},
    registry::{Registry, RegistryError},
    relation::RelationModel,
    unique::UniqueModel,
};
use crate::{config::ValidatorConfig, test_support};

static ID: [FieldModel; 1] = [FieldModel::new("id", ScalarKind::Int)];
static PRIMARY: [UniqueModel; 1] = [UniqueModel::primary(&["id"])];

fn build(models: &[&'static EntityModel]) -> Result<Registry, RegistryError> {
    Registry::build(models, ValidatorConfig::default())
}

#[test]
fn fixture_schema_wires_cleanly() {
    let registry = test_support::registry();
    let names: Vec<_> = registry.entities().map(|entity| entity.name()).collect();

    assert_eq!(names, ["Account", "Comment", "Post", "Profile", "User"]);
}

#[test]
fn key_sets_put_primary_first_then_compounds() {
    let user = test_support::entity("User");
    let described: Vec<_> = user.key_sets().iter().map(|set| set.describe()).collect();

    assert_eq!(described, ["{id}", "{email, username}"]);
    assert_eq!(user.key_sets()[1].name, "email_username");

    let profile = test_support::entity("Profile");
    assert_eq!(profile.key_sets().len(), 2);
    assert!(profile.key_sets()[0].primary);
}

#[test]
fn unknown_relation_target_is_a_wiring_error() {
    static ORPHAN: EntityModel = EntityModel {
        name: "Orphan",
        fields: &ID,
        relations: &[RelationModel::one("parent", "Missing")],
        unique_keys: &PRIMARY,
    };

    assert!(matches!(
        build(&[&ORPHAN]),
        Err(RegistryError::UnknownRelationTarget { target: "Missing", .. })
    ));
}

#[test]
fn duplicate_entities_and_members_are_rejected() {
    static ONE: EntityModel = EntityModel {
        name: "One",
        fields: &ID,
        relations: &[],
        unique_keys: &PRIMARY,
    };
    static CLASH: EntityModel = EntityModel {
        name: "Clash",
        fields: &[
            FieldModel::new("id", ScalarKind::Int),
            FieldModel::new("id", ScalarKind::Text),
        ],
        relations: &[],
        unique_keys: &PRIMARY,
    };

    assert!(matches!(
        build(&[&ONE, &ONE]),
        Err(RegistryError::DuplicateEntity("One"))
    ));
    assert!(matches!(
        build(&[&CLASH]),
        Err(RegistryError::DuplicateMember { name: "id", .. })
    ));
}

#[test]
fn unique_keys_must_be_declared_scalars() {
    static NO_PRIMARY: EntityModel = EntityModel {
        name: "NoPrimary",
        fields: &ID,
        relations: &[],
        unique_keys: &[UniqueModel::new(&["id"])],
    };
    static JSON_KEY: EntityModel = EntityModel {
        name: "JsonKey",
        fields: &[
            FieldModel::new("id", ScalarKind::Int),
            FieldModel::new("doc", ScalarKind::Json),
        ],
        relations: &[],
        unique_keys: &[UniqueModel::primary(&["id"]), UniqueModel::new(&["doc"])],
    };
    static TYPO: EntityModel = EntityModel {
        name: "Typo",
        fields: &ID,
        relations: &[],
        unique_keys: &[UniqueModel::primary(&["idd"])],
    };

    assert!(matches!(
        build(&[&NO_PRIMARY]),
        Err(RegistryError::PrimaryKey { found: 0, .. })
    ));
    assert!(matches!(
        build(&[&JSON_KEY]),
        Err(RegistryError::InvalidUniqueField { field: "doc", .. })
    ));
    assert!(matches!(
        build(&[&TYPO]),
        Err(RegistryError::UnknownUniqueField { field: "idd", .. })
    ));
}

#[test]
fn foreign_keys_and_inverses_must_resolve() {
    static PARENT: EntityModel = EntityModel {
        name: "Parent",
        fields: &ID,
        relations: &[],
        unique_keys: &PRIMARY,
    };
    static MISSING_FK: EntityModel = EntityModel {
        name: "MissingFk",
        fields: &ID,
        relations: &[RelationModel::one("parent", "Parent").owning(&["parent_id"], &["id"])],
        unique_keys: &PRIMARY,
    };
    static DANGLING: EntityModel = EntityModel {
        name: "Dangling",
        fields: &[
            FieldModel::new("id", ScalarKind::Int),
            FieldModel::new("parent_id", ScalarKind::Int),
        ],
        relations: &[RelationModel::one("parent", "Parent")
            .owning(&["parent_id"], &["id"])
            .inverse("children")],
        unique_keys: &PRIMARY,
    };

    assert!(matches!(
        build(&[&PARENT, &MISSING_FK]),
        Err(RegistryError::UnknownForeignKey { field: "parent_id", .. })
    ));
    assert!(matches!(
        build(&[&PARENT, &DANGLING]),
        Err(RegistryError::DanglingInverse { inverse: "children", .. })
    ));
}

#[test]
fn enums_need_variants() {
    static EMPTY: EnumModel = EnumModel::new("Empty", &[]);
    static TAGGED: EntityModel = EntityModel {
        name: "Tagged",
        fields: &[
            FieldModel::new("id", ScalarKind::Int),
            FieldModel::new("tag", ScalarKind::Enum(&EMPTY)),
        ],
        relations: &[],
        unique_keys: &PRIMARY,
    };

    assert!(matches!(
        build(&[&TAGGED]),
        Err(RegistryError::EmptyEnum { field: "tag", .. })
    ));
}

#[test]
fn wiring_errors_render_readable_messages() {
    let err = RegistryError::PrimaryKey {
        entity: "Thing",
        found: 2,
    };

    assert_eq!(
        err.to_string(),
        "entity 'Thing' must declare exactly one primary key, found 2"
    );
}
