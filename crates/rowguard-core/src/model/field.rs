use std::fmt;

///
/// ScalarKind
///
/// Runtime type of one persisted column.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ScalarKind {
    /// 64-bit signed integer.
    BigInt,
    Bool,
    DateTime,
    Decimal,
    Enum(&'static EnumModel),
    /// Finite 64-bit float.
    Float,
    /// 32-bit signed integer.
    Int,
    Json,
    Text,
}

impl ScalarKind {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::BigInt | Self::Decimal | Self::Float | Self::Int)
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Kinds supporting `lt`/`lte`/`gt`/`gte`.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(
            self,
            Self::BigInt | Self::DateTime | Self::Decimal | Self::Float | Self::Int | Self::Text
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BigInt => "bigint",
            Self::Bool => "boolean",
            Self::DateTime => "datetime",
            Self::Decimal => "decimal",
            Self::Enum(_) => "enum",
            Self::Float => "float",
            Self::Int => "int",
            Self::Json => "json",
            Self::Text => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(model) => write!(f, "enum {}", model.name),
            other => f.write_str(other.name()),
        }
    }
}

///
/// EnumModel
///

#[derive(Debug, Eq, PartialEq)]
pub struct EnumModel {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumModel {
    #[must_use]
    pub const fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        Self { name, variants }
    }

    #[must_use]
    pub fn contains(&self, variant: &str) -> bool {
        self.variants.contains(&variant)
    }

    /// Legal set rendered for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("one of [{}]", self.variants.join(", "))
    }
}

///
/// FieldModel
/// One scalar column of an entity.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldModel {
    pub name: &'static str,
    pub kind: ScalarKind,
    /// `null` (SQL NULL) is a legal value.
    pub nullable: bool,
    /// Scalar list column (`string[]`); elements are never null.
    pub list: bool,
    /// Storage supplies a value when a create omits the field.
    pub has_default: bool,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: ScalarKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            list: false,
            has_default: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn list(mut self) -> Self {
        self.list = true;
        self
    }

    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// A create payload must supply this field.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        !self.nullable && !self.has_default && !self.list
    }

    /// Human-readable type used in `expected` slots of issues.
    #[must_use]
    pub fn describe(&self) -> String {
        let base = match self.kind {
            ScalarKind::Enum(model) => model.describe(),
            other => other.to_string(),
        };
        let base = if self.list { format!("{base}[]") } else { base };

        if self.nullable {
            format!("{base} | null")
        } else {
            base
        }
    }
}
