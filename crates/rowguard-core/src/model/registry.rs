//! Module: model::registry
//! Responsibility: wire static entity descriptors into one read-only lookup table.
//! Does not own: per-request validation state.
//! Boundary: the only place static wiring errors are raised.

use crate::{
    config::ValidatorConfig,
    error::ValidationError,
    filter::{self, Filter},
    model::{
        entity::EntityModel,
        field::{FieldModel, ScalarKind},
        relation::RelationModel,
        unique::KeySet,
    },
    mutation::{self, CreateInput, CreateManyArgs, UpdateInput, UpdateManyArgs, UpsertArgs},
    obs::Operation,
    query::{self, AggregateArgs, FindArgs, GroupByArgs, OrderBy},
    unique::{self, ResolvedKey},
    validate::{self, Context, Record},
    value::Input,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// RegistryError
///
/// Static wiring error found while building the registry.
/// These are programming errors in the schema definition and are fatal.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum RegistryError {
    #[error("entity '{entity}': inverse '{inverse}' of relation '{relation}' does not point back")]
    DanglingInverse {
        entity: &'static str,
        relation: &'static str,
        inverse: &'static str,
    },

    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(&'static str),

    #[error("entity '{entity}': name '{name}' is declared more than once")]
    DuplicateMember {
        entity: &'static str,
        name: &'static str,
    },

    #[error("entity '{entity}': enum field '{field}' declares no variants")]
    EmptyEnum {
        entity: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}': unique key with no fields")]
    EmptyUniqueKey { entity: &'static str },

    #[error("entity '{entity}': relation '{relation}' has mismatched fields/references")]
    ForeignKeyArity {
        entity: &'static str,
        relation: &'static str,
    },

    #[error("entity '{entity}': unique key field '{field}' must be a non-list, non-json scalar")]
    InvalidUniqueField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}': to-many relation '{relation}' cannot own foreign keys")]
    OwningToMany {
        entity: &'static str,
        relation: &'static str,
    },

    #[error("entity '{entity}' must declare exactly one primary key, found {found}")]
    PrimaryKey { entity: &'static str, found: usize },

    #[error("entity '{entity}': relation '{relation}' uses unknown foreign key '{field}'")]
    UnknownForeignKey {
        entity: &'static str,
        relation: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}': relation '{relation}' references unknown field '{field}'")]
    UnknownReference {
        entity: &'static str,
        relation: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}': relation '{relation}' targets unknown entity '{target}'")]
    UnknownRelationTarget {
        entity: &'static str,
        relation: &'static str,
        target: &'static str,
    },

    #[error("entity '{entity}': unique key uses unknown field '{field}'")]
    UnknownUniqueField {
        entity: &'static str,
        field: &'static str,
    },
}

///
/// SchemaInfo
///
/// Lookup tables derived once from an `EntityModel`.
///

#[derive(Debug)]
pub(crate) struct SchemaInfo {
    pub(crate) model: &'static EntityModel,
    fields: BTreeMap<&'static str, &'static FieldModel>,
    relations: BTreeMap<&'static str, &'static RelationModel>,
    // foreign-key field -> owning relation
    foreign_keys: BTreeMap<&'static str, &'static str>,
    // primary first, then single-field keys, then compounds
    key_sets: Vec<KeySet>,
    key_fields: BTreeSet<&'static str>,
}

impl SchemaInfo {
    fn from_model(model: &'static EntityModel) -> Result<Self, RegistryError> {
        let entity = model.name;
        let mut fields = BTreeMap::new();
        let mut relations = BTreeMap::new();

        for field in model.fields {
            if fields.insert(field.name, field).is_some() {
                return Err(RegistryError::DuplicateMember {
                    entity,
                    name: field.name,
                });
            }
            if let ScalarKind::Enum(enum_model) = field.kind
                && enum_model.variants.is_empty()
            {
                return Err(RegistryError::EmptyEnum {
                    entity,
                    field: field.name,
                });
            }
        }

        let mut foreign_keys = BTreeMap::new();
        for relation in model.relations {
            if fields.contains_key(relation.name)
                || relations.insert(relation.name, relation).is_some()
            {
                return Err(RegistryError::DuplicateMember {
                    entity,
                    name: relation.name,
                });
            }
            if relation.fields.len() != relation.references.len() {
                return Err(RegistryError::ForeignKeyArity {
                    entity,
                    relation: relation.name,
                });
            }
            if relation.is_owning() && relation.is_many() {
                return Err(RegistryError::OwningToMany {
                    entity,
                    relation: relation.name,
                });
            }
            for &fk in relation.fields {
                if !fields.contains_key(fk) {
                    return Err(RegistryError::UnknownForeignKey {
                        entity,
                        relation: relation.name,
                        field: fk,
                    });
                }
                foreign_keys.insert(fk, relation.name);
            }
        }

        let primaries = model.unique_keys.iter().filter(|key| key.primary).count();
        if primaries != 1 {
            return Err(RegistryError::PrimaryKey {
                entity,
                found: primaries,
            });
        }

        let mut key_fields = BTreeSet::new();
        for key in model.unique_keys {
            if key.fields.is_empty() {
                return Err(RegistryError::EmptyUniqueKey { entity });
            }
            for &name in key.fields {
                let field = fields
                    .get(name)
                    .ok_or(RegistryError::UnknownUniqueField { entity, field: name })?;
                if field.list || field.kind == ScalarKind::Json {
                    return Err(RegistryError::InvalidUniqueField { entity, field: name });
                }
                key_fields.insert(name);
            }
        }

        let mut ordered: Vec<_> = model.unique_keys.iter().collect();
        ordered.sort_by_key(|key| (!key.primary, key.is_compound()));
        let key_sets = ordered.into_iter().map(KeySet::from_model).collect();

        Ok(Self {
            model,
            fields,
            relations,
            foreign_keys,
            key_sets,
            key_fields,
        })
    }

    pub(crate) fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.get(name).copied()
    }

    pub(crate) fn relation(&self, name: &str) -> Option<&'static RelationModel> {
        self.relations.get(name).copied()
    }

    /// Owning relation of a foreign-key field.
    pub(crate) fn foreign_key(&self, name: &str) -> Option<&'static str> {
        self.foreign_keys.get(name).copied()
    }

    pub(crate) fn key_sets(&self) -> &[KeySet] {
        &self.key_sets
    }

    pub(crate) fn is_key_field(&self, name: &str) -> bool {
        self.key_fields.contains(name)
    }

    pub(crate) const fn name(&self) -> &'static str {
        self.model.name
    }
}

///
/// Registry
///
/// Process-wide, read-only table of entity schemas.
/// Built once at startup and shared across threads without locking.
///

#[derive(Debug)]
pub struct Registry {
    entities: BTreeMap<&'static str, SchemaInfo>,
    config: ValidatorConfig,
}

impl Registry {
    /// Wire the given entities; every cross reference must resolve.
    pub fn build(
        models: &[&'static EntityModel],
        config: ValidatorConfig,
    ) -> Result<Self, RegistryError> {
        let mut entities = BTreeMap::new();
        for model in models {
            let info = SchemaInfo::from_model(model)?;
            if entities.insert(model.name, info).is_some() {
                return Err(RegistryError::DuplicateEntity(model.name));
            }
        }

        for info in entities.values() {
            for relation in info.model.relations {
                Self::check_relation(&entities, info, relation)?;
            }
        }

        Ok(Self { entities, config })
    }

    fn check_relation(
        entities: &BTreeMap<&'static str, SchemaInfo>,
        info: &SchemaInfo,
        relation: &'static RelationModel,
    ) -> Result<(), RegistryError> {
        let entity = info.name();
        let target =
            entities
                .get(relation.target)
                .ok_or(RegistryError::UnknownRelationTarget {
                    entity,
                    relation: relation.name,
                    target: relation.target,
                })?;

        for &reference in relation.references {
            if target.field(reference).is_none() {
                return Err(RegistryError::UnknownReference {
                    entity,
                    relation: relation.name,
                    field: reference,
                });
            }
        }

        if let Some(inverse) = relation.inverse {
            let points_back = target
                .relation(inverse)
                .is_some_and(|back| back.target == entity);
            if !points_back {
                return Err(RegistryError::DanglingInverse {
                    entity,
                    relation: relation.name,
                    inverse,
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<Entity<'_>> {
        self.entities.get(name).map(|info| Entity {
            registry: self,
            info,
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.entities.values().map(|info| Entity {
            registry: self,
            info,
        })
    }

    pub(crate) fn info(&self, name: &str) -> Option<&SchemaInfo> {
        self.entities.get(name)
    }
}

///
/// Entity
///
/// Borrowed handle to one entity schema; every validation entry point
/// hangs off this type.
///

#[derive(Clone, Copy, Debug)]
pub struct Entity<'r> {
    registry: &'r Registry,
    info: &'r SchemaInfo,
}

impl<'r> Entity<'r> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.info.name()
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        self.info.model
    }

    /// Accepted unique field-sets, primary first.
    #[must_use]
    pub fn key_sets(&self) -> &'r [KeySet] {
        self.info.key_sets()
    }

    fn run<T>(
        &self,
        operation: Operation,
        input: &Input,
        f: impl FnOnce(&mut Context<'r>, &'r SchemaInfo, &Input) -> Option<T>,
    ) -> Result<T, ValidationError> {
        let mut ctx = Context::new(self.registry);
        let value = f(&mut ctx, self.info, input);

        ctx.finish_for(self.name(), operation, value)
    }

    /// Validate a `where` filter.
    pub fn parse_where(&self, input: &Input) -> Result<Filter, ValidationError> {
        self.run(Operation::Where, input, filter::parse::parse_where)
    }

    /// Validate a groupBy `having` filter (scalar and aggregate filters only).
    pub fn parse_having(&self, input: &Input) -> Result<Filter, ValidationError> {
        self.run(Operation::Having, input, filter::parse::parse_having)
    }

    pub fn resolve_unique(&self, input: &Input) -> Result<ResolvedKey, ValidationError> {
        self.run(Operation::ResolveUnique, input, unique::resolve)
    }

    pub fn parse_create(&self, input: &Input) -> Result<CreateInput, ValidationError> {
        self.run(Operation::Create, input, mutation::parse_create)
    }

    pub fn parse_update(&self, input: &Input) -> Result<UpdateInput, ValidationError> {
        self.run(Operation::Update, input, mutation::parse_update)
    }

    pub fn parse_create_many(&self, input: &Input) -> Result<CreateManyArgs, ValidationError> {
        self.run(Operation::CreateMany, input, mutation::parse_create_many)
    }

    pub fn parse_upsert(&self, input: &Input) -> Result<UpsertArgs, ValidationError> {
        self.run(Operation::Upsert, input, mutation::parse_upsert)
    }

    pub fn parse_update_many(&self, input: &Input) -> Result<UpdateManyArgs, ValidationError> {
        self.run(Operation::UpdateMany, input, mutation::parse_update_many)
    }

    pub fn parse_delete_many(&self, input: &Input) -> Result<Filter, ValidationError> {
        self.run(Operation::DeleteMany, input, mutation::parse_delete_many)
    }

    pub fn parse_order_by(&self, input: &Input) -> Result<Vec<OrderBy>, ValidationError> {
        self.run(Operation::OrderBy, input, query::parse_order_by)
    }

    pub fn parse_find_many(&self, input: &Input) -> Result<FindArgs, ValidationError> {
        self.run(Operation::FindMany, input, query::parse_find_many)
    }

    pub fn parse_aggregate(&self, input: &Input) -> Result<AggregateArgs, ValidationError> {
        self.run(Operation::Aggregate, input, query::parse_aggregate)
    }

    pub fn parse_group_by(&self, input: &Input) -> Result<GroupByArgs, ValidationError> {
        self.run(Operation::GroupBy, input, query::parse_group_by)
    }

    /// Re-validate a row returned by the storage collaborator.
    pub fn parse_row(&self, input: &Input) -> Result<Record, ValidationError> {
        self.run(Operation::Row, input, validate::row::parse_row)
    }
}
