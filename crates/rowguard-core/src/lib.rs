//! Core runtime for rowguard: entity descriptors, scalar and JSON schemas,
//! the filter grammar, unique-key resolution, mutation inputs, and the
//! ordering/aggregation descriptors handed to a storage collaborator.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod mutation;
pub mod obs;
pub mod query;
pub mod types;
pub mod unique;
pub mod validate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Separator used when deriving the default name of a compound unique key.
pub const COMPOUND_KEY_SEPARATOR: &str = "_";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or parsing helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        filter::Filter,
        model::{
            entity::EntityModel,
            field::{EnumModel, FieldModel, ScalarKind},
            registry::{Entity, Registry},
            relation::{Cardinality, RelationModel},
            unique::UniqueModel,
        },
        types::Decimal,
        unique::ResolvedKey,
        value::{Input, Value},
    };
}
