mod decimal;

pub use decimal::{Decimal, DecimalError, DecimalTriple};
