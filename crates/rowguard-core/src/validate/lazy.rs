use crate::{validate::Context, value::Input};
use std::sync::OnceLock;

///
/// Schema
///
/// Anything that validates one raw input into a normalized output,
/// recording issues on the context.
///

pub(crate) trait Schema: Send + Sync {
    type Output;

    fn validate(&self, ctx: &mut Context<'_>, input: &Input) -> Option<Self::Output>;
}

///
/// Lazy
///
/// Deferred schema: built by `init` on first use and cached for the life
/// of the process. Self-referential schemas point at a `Lazy` static
/// instead of constructing their children eagerly.
///

pub(crate) struct Lazy<S> {
    cell: OnceLock<S>,
    init: fn() -> S,
}

impl<S> Lazy<S> {
    pub(crate) const fn new(init: fn() -> S) -> Self {
        Self {
            cell: OnceLock::new(),
            init,
        }
    }

    pub(crate) fn get(&self) -> &S {
        self.cell.get_or_init(self.init)
    }
}

impl<S: Schema> Schema for Lazy<S> {
    type Output = S::Output;

    fn validate(&self, ctx: &mut Context<'_>, input: &Input) -> Option<Self::Output> {
        self.get().validate(ctx, input)
    }
}
