//! Storage seam of the uniqueness validator

use std::collections::BTreeMap;

use super::metadata::EntityMetadata;
use super::value::{EntityRef, FieldValue};

/// Ordered `field = value` conditions; a [`FieldValue::Null`] value means
/// "field IS NULL"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(Vec<(String, FieldValue)>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing an earlier one on the same field
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        let field = field.into();
        match self.0.iter_mut().find(|(k, _)| *k == field) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every condition holds for `record`
    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, value)| record.get(field).unwrap_or(&FieldValue::Null) == value)
    }
}

/// A persisted row returned by a gateway query
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Identifier values of this record, in the metadata's key order
    pub fn identifier(&self, metadata: &EntityMetadata) -> Vec<(String, FieldValue)> {
        metadata
            .identifier_fields()
            .iter()
            .map(|name| {
                let value = self.get(name).cloned().unwrap_or(FieldValue::Null);
                (name.clone(), value)
            })
            .collect()
    }

    /// Reference to this record, carrying its natural string form when
    /// the entity declares one
    pub fn to_ref(&self, metadata: &EntityMetadata) -> EntityRef {
        let mut reference = EntityRef::new(self.entity.clone(), self.identifier(metadata));
        let display = metadata
            .display_field_name()
            .and_then(|field| self.get(field))
            .and_then(FieldValue::as_text)
            .map(str::to_string);
        reference.mark_loaded(display);
        reference
    }
}

/// Metadata lookup plus the queries the validator needs
#[trait_variant::make(ObjectGateway: Send)]
pub trait LocalObjectGateway {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persistence metadata of `entity`, if the gateway manages it
    fn metadata(&self, entity: &str) -> Option<&EntityMetadata>;

    /// Rows of `entity` matching every condition, at most `limit` of them
    async fn find_matching(
        &self,
        entity: &str,
        criteria: &Criteria,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Load a lazy reference so its identifier and display form are usable
    async fn resolve(&self, reference: &mut EntityRef) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_insert_replaces() {
        let mut criteria = Criteria::new();
        criteria.insert("email", "a@x.com".into());
        criteria.insert("name", FieldValue::Null);
        criteria.insert("email", "b@x.com".into());

        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria.get("email"), Some(&FieldValue::from("b@x.com")));
        let order: Vec<&str> = criteria.iter().map(|(k, _)| k).collect();
        assert_eq!(order, ["email", "name"]);
    }

    #[test]
    fn test_criteria_null_matches_missing_field() {
        let record = Record::new("user").with("id", 1i64).with("email", "a@x.com");
        let mut criteria = Criteria::new();
        criteria.insert("email", "a@x.com".into());
        criteria.insert("surname", FieldValue::Null);
        assert!(criteria.matches(&record));

        criteria.insert("email", "b@x.com".into());
        assert!(!criteria.matches(&record));
    }

    #[test]
    fn test_record_to_ref() {
        let meta = EntityMetadata::new("user", "users")
            .field("id", "id")
            .field("email", "email")
            .identifier(["id"])
            .display_field("email");
        let record = Record::new("user").with("id", 7i64).with("email", "a@x.com");

        let reference = record.to_ref(&meta);
        assert!(reference.is_loaded());
        assert_eq!(reference, EntityRef::by_id("user", 7));
        assert_eq!(reference.display(), Some("a@x.com"));
    }
}
