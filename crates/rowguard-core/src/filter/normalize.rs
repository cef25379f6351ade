use crate::filter::ast::{Filter, RelationFilter};

impl Filter {
    ///
    /// Normalize a filter into a canonical form.
    ///
    /// Normalization guarantees:
    /// - Evaluation is preserved for every row
    /// - Nested AND / OR nodes are flattened
    /// - Neutral elements are removed (True / False)
    /// - Double negation is eliminated
    /// - Single-child AND / OR collapse to the child
    ///
    /// Child order is kept as written.
    ///
    #[must_use]
    pub fn normalize(&self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => Self::False,
            Self::And(children) => normalize_and(children),
            Self::Or(children) => normalize_or(children),
            Self::Not(inner) => normalize_not(inner),
            Self::Relation { relation, filter } => Self::Relation {
                relation: relation.clone(),
                filter: normalize_relation(filter),
            },
            leaf @ (Self::Field { .. } | Self::Aggregate { .. }) => leaf.clone(),
        }
    }
}

///
/// Normalize a NOT expression.
///
/// - NOT (NOT x) → x
/// - NOT True    → False
/// - NOT False   → True
///
fn normalize_not(inner: &Filter) -> Filter {
    match inner.normalize() {
        Filter::Not(double) => *double,
        Filter::True => Filter::False,
        Filter::False => Filter::True,
        other => Filter::Not(Box::new(other)),
    }
}

///
/// Normalize an AND expression.
///
/// - AND(True, x)      → x
/// - AND(False, x)     → False
/// - AND(AND(a, b), c) → AND(a, b, c)
/// - AND()             → True
///
fn normalize_and(children: &[Filter]) -> Filter {
    let mut out = Vec::new();

    for child in children {
        match child.normalize() {
            Filter::True => {}
            Filter::False => return Filter::False,
            Filter::And(grandchildren) => out.extend(grandchildren),
            other => out.push(other),
        }
    }

    match out.len() {
        0 => Filter::True,
        1 => out.pop().unwrap_or(Filter::True),
        _ => Filter::And(out),
    }
}

///
/// Normalize an OR expression.
///
/// - OR(False, x)    → x
/// - OR(True, x)     → True
/// - OR(OR(a, b), c) → OR(a, b, c)
/// - OR()            → False
///
fn normalize_or(children: &[Filter]) -> Filter {
    let mut out = Vec::new();

    for child in children {
        match child.normalize() {
            Filter::False => {}
            Filter::True => return Filter::True,
            Filter::Or(grandchildren) => out.extend(grandchildren),
            other => out.push(other),
        }
    }

    match out.len() {
        0 => Filter::False,
        1 => out.pop().unwrap_or(Filter::False),
        _ => Filter::Or(out),
    }
}

fn normalize_relation(filter: &RelationFilter) -> RelationFilter {
    let boxed = |inner: &Filter| Box::new(inner.normalize());

    match filter {
        RelationFilter::Every(inner) => RelationFilter::Every(boxed(inner)),
        RelationFilter::Is(inner) => RelationFilter::Is(inner.as_deref().map(boxed)),
        RelationFilter::IsNot(inner) => RelationFilter::IsNot(inner.as_deref().map(boxed)),
        RelationFilter::None(inner) => RelationFilter::None(boxed(inner)),
        RelationFilter::Some(inner) => RelationFilter::Some(boxed(inner)),
    }
}
