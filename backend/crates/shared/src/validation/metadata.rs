//! Entity metadata exposed by an object gateway
//!
//! Declares which names are persisted fields or associations of an entity,
//! how they map to storage columns, and which fields identify a row.

use std::collections::BTreeMap;

/// Shape of a mapped field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain column
    Scalar,
    /// Column of a custom type, read back as [`CustomValue`](super::value::CustomValue)
    Custom { type_name: String },
    /// Foreign key to another entity, compared on the target's identifier
    Association { target: String },
}

/// A mapped field of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub column: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn is_association(&self) -> bool {
        matches!(self.kind, FieldKind::Association { .. })
    }
}

/// Persistence metadata of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    name: String,
    table: String,
    fields: Vec<FieldSpec>,
    identifier: Vec<String>,
    display_field: Option<String>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            identifier: Vec::new(),
            display_field: None,
        }
    }

    /// Declare a scalar field stored in `column`
    pub fn field(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            column: column.into(),
            kind: FieldKind::Scalar,
        });
        self
    }

    /// Declare a field of custom type `type_name` stored in `column`
    pub fn custom_field(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            column: column.into(),
            kind: FieldKind::Custom {
                type_name: type_name.into(),
            },
        });
        self
    }

    /// Declare an association stored as a foreign key in `column`
    pub fn association(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            column: column.into(),
            kind: FieldKind::Association {
                target: target.into(),
            },
        });
        self
    }

    /// Declare the identifier fields, in key order
    pub fn identifier<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Field whose value is the object's natural string form
    pub fn display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.get(name).is_some_and(FieldSpec::is_association)
    }

    /// Whether `name` is a persisted field or association
    pub fn is_mapped(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn identifier_fields(&self) -> &[String] {
        &self.identifier
    }

    pub fn display_field_name(&self) -> Option<&str> {
        self.display_field.as_deref()
    }
}

/// Metadata for every entity a gateway can query
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: BTreeMap<String, EntityMetadata>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metadata: EntityMetadata) -> Self {
        self.entities.insert(metadata.name.clone(), metadata);
        self
    }

    pub fn get(&self, entity: &str) -> Option<&EntityMetadata> {
        self.entities.get(entity)
    }
}
