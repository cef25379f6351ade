//! Observability boundary.
//!
//! Validation code never logs directly; it emits `ValidationEvent`s through
//! `sink::record`, which routes them to the active `ValidationSink`.
mod sink;

pub use sink::{Operation, TracingSink, ValidationEvent, ValidationSink, with_sink};

pub(crate) use sink::record;
