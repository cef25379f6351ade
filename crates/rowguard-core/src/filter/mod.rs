//! Filter grammar: the validated `where`/`having` tree, its normalizer, and
//! a reference evaluator over in-memory rows.
mod ast;
pub mod eval;
mod normalize;
pub(crate) mod parse;

#[cfg(test)]
mod tests;

pub use ast::{
    AggregateFn, CompareOp, FieldFilter, Filter, JsonCondition, JsonFilter, ListCondition,
    ListFilter, RelationFilter, ScalarCondition, ScalarFilter,
};
pub use eval::{FieldPresence, RelationPresence, Row, eval};
