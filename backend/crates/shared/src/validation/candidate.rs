use super::value::FieldValue;

/// An object whose fields are checked for uniqueness
///
/// Managed candidates are entities tracked by the persistence layer
/// (persisted rows or entities about to be inserted); their `type_name`
/// is the entity name. Transient candidates are plain objects such as
/// request DTOs.
pub trait Candidate {
    fn type_name(&self) -> &str;

    fn is_managed(&self) -> bool;

    /// Whether the candidate belongs to `entity` or one of its subtypes
    fn is_instance_of(&self, entity: &str) -> bool {
        self.type_name() == entity
    }

    /// Value of the property `name`, or `None` when the candidate has no
    /// such property. A property that exists but is unset reads as
    /// [`FieldValue::Null`].
    fn field(&self, name: &str) -> Option<FieldValue>;
}
