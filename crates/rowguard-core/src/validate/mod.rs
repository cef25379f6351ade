//! Leaf and row validation.
//!
//! `scalar` and `json` are the leaves every other grammar bottoms out in;
//! `context` carries the path stack and issue list through one call.
mod context;
pub(crate) mod json;
mod lazy;
pub(crate) mod row;
pub(crate) mod scalar;

pub(crate) use context::Context;
pub(crate) use lazy::{Lazy, Schema};

pub use json::JsonOperand;
pub use row::{Record, RecordRelation};
pub use scalar::{validate_scalar, validate_scalar_with};
