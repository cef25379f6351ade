use crate::model::{field::FieldModel, relation::RelationModel, unique::UniqueModel};

///
/// EntityModel
/// Static descriptor for one entity (table).
///

#[derive(Debug, Eq, PartialEq)]
pub struct EntityModel {
    /// Stable external name used for relation targets and diagnostics.
    pub name: &'static str,
    /// Ordered scalar columns.
    pub fields: &'static [FieldModel],
    pub relations: &'static [RelationModel],
    /// Accepted field-sets; exactly one must be primary.
    pub unique_keys: &'static [UniqueModel],
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationModel> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&'static UniqueModel> {
        self.unique_keys.iter().find(|key| key.primary)
    }
}
