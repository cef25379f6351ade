use crate::{
    validate::JsonOperand,
    value::{TextMode, TextOp, Value},
};
use serde::Serialize;
use serde_json::Value as JsonValue;

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Ordering operator for an operator key (`lt`, `lte`, `gt`, `gte`).
    #[must_use]
    pub fn ordering(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

///
/// AggregateFn
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum AggregateFn {
    Avg,
    Count,
    Max,
    Min,
    Sum,
}

impl AggregateFn {
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "_avg" => Some(Self::Avg),
            "_count" => Some(Self::Count),
            "_max" => Some(Self::Max),
            "_min" => Some(Self::Min),
            "_sum" => Some(Self::Sum),
            _ => None,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Avg => "_avg",
            Self::Count => "_count",
            Self::Max => "_max",
            Self::Min => "_min",
            Self::Sum => "_sum",
        }
    }
}

///
/// Filter
///
/// Validated boolean filter over one entity.
///
/// `And(vec![])` matches every row and `Or(vec![])` matches none.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Filter {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Field {
        field: String,
        filter: FieldFilter,
    },
    /// Aggregate of a grouped column (`having` only).
    Aggregate {
        field: String,
        function: AggregateFn,
        filter: ScalarFilter,
    },
    Relation {
        relation: String,
        filter: RelationFilter,
    },
}

impl Filter {
    #[must_use]
    pub fn field(field: &str, filter: impl Into<FieldFilter>) -> Self {
        Self::Field {
            field: field.to_string(),
            filter: filter.into(),
        }
    }

    #[must_use]
    pub fn relation(relation: &str, filter: RelationFilter) -> Self {
        Self::Relation {
            relation: relation.to_string(),
            filter,
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Collapse a list of parts; a single part stands alone.
    pub(crate) fn all(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1
            && let Some(only) = parts.pop()
        {
            return only;
        }

        Self::And(parts)
    }
}

///
/// FieldFilter
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FieldFilter {
    Json(JsonFilter),
    List(ListFilter),
    Scalar(ScalarFilter),
}

impl From<ScalarFilter> for FieldFilter {
    fn from(filter: ScalarFilter) -> Self {
        Self::Scalar(filter)
    }
}

impl From<ListFilter> for FieldFilter {
    fn from(filter: ListFilter) -> Self {
        Self::List(filter)
    }
}

impl From<JsonFilter> for FieldFilter {
    fn from(filter: JsonFilter) -> Self {
        Self::Json(filter)
    }
}

///
/// ScalarFilter
///
/// Conditions on one scalar column, all of which must hold.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScalarFilter {
    pub mode: TextMode,
    pub conditions: Vec<ScalarCondition>,
}

impl ScalarFilter {
    #[must_use]
    pub fn equals(value: impl Into<Value>) -> Self {
        Self {
            mode: TextMode::Cs,
            conditions: vec![ScalarCondition::Compare {
                op: CompareOp::Eq,
                value: value.into(),
            }],
        }
    }
}

///
/// ScalarCondition
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum ScalarCondition {
    Compare { op: CompareOp, value: Value },
    In(Vec<Value>),
    Not(Box<ScalarFilter>),
    NotIn(Vec<Value>),
    Text { op: TextOp, value: String },
}

///
/// ListFilter
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ListFilter {
    pub conditions: Vec<ListCondition>,
}

///
/// ListCondition
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum ListCondition {
    Equals(Vec<Value>),
    Has(Value),
    HasEvery(Vec<Value>),
    HasSome(Vec<Value>),
    IsEmpty(bool),
}

///
/// JsonFilter
///
/// Conditions on the JSON value found at `path` (the whole document when
/// the path is empty).
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct JsonFilter {
    pub path: Vec<String>,
    pub mode: TextMode,
    pub conditions: Vec<JsonCondition>,
}

///
/// JsonCondition
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum JsonCondition {
    ArrayContains(JsonValue),
    ArrayEndsWith(JsonValue),
    ArrayStartsWith(JsonValue),
    Compare { op: CompareOp, value: JsonValue },
    Equals(JsonOperand),
    Not(JsonOperand),
    String { op: TextOp, value: String },
}

///
/// RelationFilter
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[remain::sorted]
pub enum RelationFilter {
    /// Every related row matches (vacuously true when none exist).
    Every(Box<Filter>),
    /// The related row exists and matches; `None` tests for absence.
    Is(Option<Box<Filter>>),
    IsNot(Option<Box<Filter>>),
    /// No related row matches.
    None(Box<Filter>),
    /// At least one related row matches.
    Some(Box<Filter>),
}
