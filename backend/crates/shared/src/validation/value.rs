//! Field values as seen by the uniqueness validator

use chrono::{DateTime, Utc};

/// A single field value read from a candidate or a persisted record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent, null, or not yet initialized
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Value of a custom column type
    Custom(CustomValue),
    /// Reference to another persisted entity (association)
    Ref(EntityRef),
}

impl FieldValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_mut(&mut self) -> Option<&mut EntityRef> {
        match self {
            FieldValue::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<CustomValue> for FieldValue {
    fn from(value: CustomValue) -> Self {
        FieldValue::Custom(value)
    }
}

impl From<EntityRef> for FieldValue {
    fn from(value: EntityRef) -> Self {
        FieldValue::Ref(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Scalar of a custom column type, e.g. an enum stored as its code
///
/// Compared on type and stored form; the display form only affects
/// violation messages.
#[derive(Debug, Clone)]
pub struct CustomValue {
    type_name: String,
    stored: String,
    display: Option<String>,
}

impl CustomValue {
    pub fn new(type_name: impl Into<String>, stored: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            stored: stored.into(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Form written to the column
    pub fn stored(&self) -> &str {
        &self.stored
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.stored == other.stored
    }
}

/// Reference to a persisted entity, possibly not loaded yet
///
/// Two references are equal when they point at the same entity type with
/// the same identifier values; load state and display form are ignored.
#[derive(Debug, Clone)]
pub struct EntityRef {
    entity: String,
    identifiers: Vec<(String, FieldValue)>,
    display: Option<String>,
    loaded: bool,
}

impl EntityRef {
    /// Create an unloaded reference from its identifier values
    pub fn new<I, K, V>(entity: impl Into<String>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self {
            entity: entity.into(),
            identifiers: identifiers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            display: None,
            loaded: false,
        }
    }

    /// Shorthand for the common single `id` column case
    pub fn by_id(entity: impl Into<String>, id: i64) -> Self {
        Self::new(entity, [("id", id)])
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn identifiers(&self) -> &[(String, FieldValue)] {
        &self.identifiers
    }

    pub fn identifier(&self, name: &str) -> Option<&FieldValue> {
        self.identifiers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Natural string form of the referenced object, once known
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Record the state read back from storage
    pub fn mark_loaded(&mut self, display: Option<String>) {
        self.display = display;
        self.loaded = true;
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.identifiers == other.identifiers
    }
}
