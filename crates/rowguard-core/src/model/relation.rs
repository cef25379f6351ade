///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    Many,
    One,
}

///
/// RelationModel
///
/// Reference from one entity to another. The owning side of a relation
/// carries the foreign-key `fields` and the target fields they `references`;
/// the inverse side leaves both empty.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelationModel {
    pub name: &'static str,
    /// Target entity name.
    pub target: &'static str,
    pub cardinality: Cardinality,
    pub nullable: bool,
    pub fields: &'static [&'static str],
    pub references: &'static [&'static str],
    /// Name of the relation on the target pointing back here.
    pub inverse: Option<&'static str>,
}

impl RelationModel {
    #[must_use]
    pub const fn one(name: &'static str, target: &'static str) -> Self {
        Self::new(name, target, Cardinality::One)
    }

    #[must_use]
    pub const fn many(name: &'static str, target: &'static str) -> Self {
        Self::new(name, target, Cardinality::Many)
    }

    const fn new(name: &'static str, target: &'static str, cardinality: Cardinality) -> Self {
        Self {
            name,
            target,
            cardinality,
            nullable: false,
            fields: &[],
            references: &[],
            inverse: None,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn owning(
        mut self,
        fields: &'static [&'static str],
        references: &'static [&'static str],
    ) -> Self {
        self.fields = fields;
        self.references = references;
        self
    }

    #[must_use]
    pub const fn inverse(mut self, name: &'static str) -> Self {
        self.inverse = Some(name);
        self
    }

    #[must_use]
    pub const fn is_many(&self) -> bool {
        matches!(self.cardinality, Cardinality::Many)
    }

    /// Whether this side stores the foreign key.
    #[must_use]
    pub const fn is_owning(&self) -> bool {
        !self.fields.is_empty()
    }
}
