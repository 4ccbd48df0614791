//! Uniqueness validation against persisted rows
//!
//! [`UniqueEntityValidator`] reads the constrained fields off a candidate,
//! queries the [`ObjectGateway`] for rows holding the same values, and
//! decides whether any of them is a *different* object.
//!
//! ## Outcomes
//! - [`ValidationOutcome::Unique`] - no other row holds the values
//! - [`ValidationOutcome::Violated`] - a duplicate, reported as data
//! - `Err(UniqueError::Configuration)` - the constraint does not fit the
//!   candidate or the entity metadata (a wiring defect)
//! - `Err(UniqueError::Storage)` - the gateway failed; passed through as is

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use super::candidate::Candidate;
use super::format::describe;
use super::gateway::{Criteria, ObjectGateway, Record};
use super::metadata::EntityMetadata;
use super::value::FieldValue;

/// Machine code attached to every uniqueness violation
pub const NOT_UNIQUE_ERROR: &str = "23bd9dbf-6b9b-41cd-a99e-4844bcf3077f";

/// Default violation message
pub const DEFAULT_MESSAGE: &str = "This value is already used.";

/// How many rows the lookup fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Fetch every matching row
    Exact,
    /// Fetch at most two rows, enough to tell zero, one and many apart
    #[default]
    Bounded,
}

impl MatchStrategy {
    pub const fn limit(self) -> Option<usize> {
        match self {
            MatchStrategy::Exact => None,
            MatchStrategy::Bounded => Some(2),
        }
    }
}

/// A candidate property checked against an entity field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub property: String,
    pub field: String,
}

/// Wiring defects detected while validating
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("At least one field has to be specified.")]
    EmptyFieldSet,

    #[error("No object metadata is registered for entity \"{0}\".")]
    UnknownEntity(String),

    #[error(
        "The field \"{field}\" is not mapped by \"{entity}\", so it cannot be validated for uniqueness."
    )]
    UnmappedField { field: String, entity: String },

    #[error("The field \"{field}\" is not a property of \"{type_name}\".")]
    MissingProperty { field: String, type_name: String },

    #[error("The \"{entity}\" entity does not accept \"{candidate}\" objects.")]
    UnsupportedCandidate { entity: String, candidate: String },

    #[error("The \"{entity}\" identifier field names are \"{expected}\", not \"{given}\".")]
    IdentifierMismatch {
        entity: String,
        expected: String,
        given: String,
    },
}

/// Hard failure of a validation call
#[derive(Debug, Error)]
pub enum UniqueError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Storage unavailable: {0}")]
    Storage(#[source] E),
}

/// Fields that must be unique together, plus how to check them
#[derive(Debug, Clone)]
pub struct UniqueConstraint {
    fields: Vec<FieldMapping>,
    error_path: Option<String>,
    ignore_null: bool,
    entity: Option<String>,
    identifier_field_names: Vec<String>,
    strategy: MatchStrategy,
    message: Cow<'static, str>,
}

impl UniqueConstraint {
    /// Constraint on properties named like the entity fields they map to
    pub fn new<I, S>(fields: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::mapped(fields.into_iter().map(|f| {
            let f = f.into();
            (f.clone(), f)
        }))
    }

    /// Constraint on `(property, entity field)` pairs
    pub fn mapped<I, P, F>(pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (P, F)>,
        P: Into<String>,
        F: Into<String>,
    {
        let fields: Vec<FieldMapping> = pairs
            .into_iter()
            .map(|(p, f)| FieldMapping {
                property: p.into(),
                field: f.into(),
            })
            .collect();

        if fields.is_empty() {
            return Err(ConfigurationError::EmptyFieldSet);
        }

        Ok(Self {
            fields,
            error_path: None,
            ignore_null: true,
            entity: None,
            identifier_field_names: Vec::new(),
            strategy: MatchStrategy::default(),
            message: Cow::Borrowed(DEFAULT_MESSAGE),
        })
    }

    pub fn error_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }

    pub fn ignore_null(mut self, ignore: bool) -> Self {
        self.ignore_null = ignore;
        self
    }

    /// Check against `entity` instead of the candidate's own type
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn identifier_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier_field_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Violation message; `{{ value }}` is replaced by the offending value
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Path the violation is attached to; defaults to the first entity field
    pub fn path(&self) -> &str {
        self.error_path.as_deref().unwrap_or(&self.fields[0].field)
    }

    pub fn ignores_null(&self) -> bool {
        self.ignore_null
    }

    pub fn entity_override(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifier_field_names
    }

    pub fn match_strategy(&self) -> MatchStrategy {
        self.strategy
    }

    fn field_for(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|m| m.property == name || m.field == name)
            .map(|m| m.field.as_str())
    }
}

/// A detected duplicate
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: String,
    pub invalid_value: FieldValue,
    pub display_value: String,
    pub message: String,
    pub code: &'static str,
    /// Rows that collided with the candidate
    pub cause: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Unique,
    Violated(Violation),
}

impl ValidationOutcome {
    pub fn is_unique(&self) -> bool {
        matches!(self, ValidationOutcome::Unique)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ValidationOutcome::Violated(v) => Some(v),
            ValidationOutcome::Unique => None,
        }
    }

    pub fn into_violation(self) -> Option<Violation> {
        match self {
            ValidationOutcome::Violated(v) => Some(v),
            ValidationOutcome::Unique => None,
        }
    }
}

/// Stateless apart from the gateway handle; safe to share between requests
pub struct UniqueEntityValidator<G> {
    gateway: Arc<G>,
}

impl<G> Clone for UniqueEntityValidator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: ObjectGateway> UniqueEntityValidator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn validate<C>(
        &self,
        candidate: &C,
        constraint: &UniqueConstraint,
    ) -> Result<ValidationOutcome, UniqueError<G::Error>>
    where
        C: Candidate + Sync + ?Sized,
    {
        let entity = match constraint.entity_override() {
            Some(target) => {
                if candidate.is_managed() && !candidate.is_instance_of(target) {
                    return Err(ConfigurationError::UnsupportedCandidate {
                        entity: target.to_string(),
                        candidate: candidate.type_name().to_string(),
                    }
                    .into());
                }
                target
            }
            None => candidate.type_name(),
        };

        let metadata = self
            .gateway
            .metadata(entity)
            .ok_or_else(|| ConfigurationError::UnknownEntity(entity.to_string()))?;

        let values = read_fields(candidate, metadata, constraint.fields())?;
        let has_null = values.iter().any(|(_, v)| v.is_null());
        if has_null && constraint.ignores_null() {
            tracing::trace!(entity, "Skipping uniqueness check: null value ignored");
            return Ok(ValidationOutcome::Unique);
        }

        let mut criteria = Criteria::new();
        for (field, value) in values {
            criteria.insert(field, value);
        }
        if criteria.is_empty() {
            return Ok(ValidationOutcome::Unique);
        }

        for (field, value) in criteria.iter_mut() {
            if !metadata.has_association(field) {
                continue;
            }
            if let Some(reference) = value.as_ref_mut() {
                if !reference.is_loaded() {
                    self.gateway
                        .resolve(reference)
                        .await
                        .map_err(UniqueError::Storage)?;
                }
            }
        }

        let matches = self
            .gateway
            .find_matching(
                metadata.name(),
                &criteria,
                constraint.match_strategy().limit(),
            )
            .await
            .map_err(UniqueError::Storage)?;

        if let [only] = matches.as_slice() {
            if candidate.is_managed() && is_same_row(candidate, metadata, only) {
                return Ok(ValidationOutcome::Unique);
            }
            if !candidate.is_managed()
                && !constraint.identifiers().is_empty()
                && declares_same_row(candidate, metadata, constraint.identifiers(), only)?
            {
                return Ok(ValidationOutcome::Unique);
            }
        } else if matches.is_empty() {
            return Ok(ValidationOutcome::Unique);
        }

        let violation = self.violation(constraint, &criteria, matches);
        tracing::debug!(
            entity = metadata.name(),
            path = %violation.path,
            value = %violation.display_value,
            "Uniqueness violation"
        );
        Ok(ValidationOutcome::Violated(violation))
    }

    fn violation(
        &self,
        constraint: &UniqueConstraint,
        criteria: &Criteria,
        cause: Vec<Record>,
    ) -> Violation {
        let path = constraint.path().to_string();
        let first = &constraint.fields()[0].field;

        let invalid_value = criteria
            .get(&path)
            .or_else(|| constraint.field_for(&path).and_then(|f| criteria.get(f)))
            .or_else(|| criteria.get(first))
            .cloned()
            .unwrap_or(FieldValue::Null);

        let lookup = |entity: &str| self.gateway.metadata(entity);
        let display_value = describe(&invalid_value, &lookup);
        let message = constraint.message.replace("{{ value }}", &display_value);

        Violation {
            path,
            invalid_value,
            display_value,
            message,
            code: NOT_UNIQUE_ERROR,
            cause,
        }
    }
}

/// `(entity field, value)` pairs read off the candidate
fn read_fields<C>(
    candidate: &C,
    metadata: &EntityMetadata,
    mappings: &[FieldMapping],
) -> Result<Vec<(String, FieldValue)>, ConfigurationError>
where
    C: Candidate + ?Sized,
{
    mappings
        .iter()
        .map(|m| {
            if !metadata.is_mapped(&m.field) {
                return Err(ConfigurationError::UnmappedField {
                    field: m.field.clone(),
                    entity: metadata.name().to_string(),
                });
            }
            let value =
                candidate
                    .field(&m.property)
                    .ok_or_else(|| ConfigurationError::MissingProperty {
                        field: m.property.clone(),
                        type_name: candidate.type_name().to_string(),
                    })?;
            Ok((m.field.clone(), value))
        })
        .collect()
}

/// A managed candidate is the matched row when both carry the same
/// identifier values; an unsaved candidate has no identifier yet
fn is_same_row<C>(candidate: &C, metadata: &EntityMetadata, row: &Record) -> bool
where
    C: Candidate + ?Sized,
{
    let ids = metadata.identifier_fields();
    !ids.is_empty()
        && ids.iter().all(|name| match candidate.field(name) {
            None | Some(FieldValue::Null) => false,
            Some(value) => row.get(name) == Some(&value),
        })
}

fn declares_same_row<C>(
    candidate: &C,
    metadata: &EntityMetadata,
    names: &[String],
    row: &Record,
) -> Result<bool, ConfigurationError>
where
    C: Candidate + ?Sized,
{
    let mappings: Vec<FieldMapping> = names
        .iter()
        .map(|n| FieldMapping {
            property: n.clone(),
            field: n.clone(),
        })
        .collect();
    let declared = read_fields(candidate, metadata, &mappings)?;

    if metadata.identifier_fields() != names {
        return Err(ConfigurationError::IdentifierMismatch {
            entity: metadata.name().to_string(),
            expected: metadata.identifier_fields().join(", "),
            given: names.join(", "),
        });
    }

    Ok(declared
        .iter()
        .all(|(name, value)| row.get(name).unwrap_or(&FieldValue::Null) == value))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::validation::metadata::EntityCatalog;
    use crate::validation::value::EntityRef;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Offline;

    struct MemoryGateway {
        catalog: EntityCatalog,
        rows: Mutex<Vec<Record>>,
        offline: bool,
        queries: AtomicUsize,
        last_limit: Mutex<Option<Option<usize>>>,
        resolved: AtomicUsize,
    }

    impl MemoryGateway {
        fn new(rows: Vec<Record>) -> Self {
            let catalog = EntityCatalog::new()
                .with(
                    EntityMetadata::new("user", "users")
                        .field("id", "id")
                        .field("name", "name")
                        .field("surname", "surname")
                        .field("email", "email")
                        .identifier(["id"])
                        .display_field("email"),
                )
                .with(
                    EntityMetadata::new("certificate", "certificate")
                        .field("id", "id")
                        .field("name", "name")
                        .association("user", "user_id", "user")
                        .identifier(["id"]),
                );
            Self {
                catalog,
                rows: Mutex::new(rows),
                offline: false,
                queries: AtomicUsize::new(0),
                last_limit: Mutex::new(None),
                resolved: AtomicUsize::new(0),
            }
        }

        fn offline(mut self) -> Self {
            self.offline = true;
            self
        }
    }

    impl ObjectGateway for MemoryGateway {
        type Error = Offline;

        fn metadata(&self, entity: &str) -> Option<&EntityMetadata> {
            self.catalog.get(entity)
        }

        async fn find_matching(
            &self,
            entity: &str,
            criteria: &Criteria,
            limit: Option<usize>,
        ) -> Result<Vec<Record>, Offline> {
            if self.offline {
                return Err(Offline);
            }
            self.queries.fetch_add(1, Ordering::SeqCst);
            *self.last_limit.lock().unwrap() = Some(limit);
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| r.entity() == entity && criteria.matches(r))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect())
        }

        async fn resolve(&self, reference: &mut EntityRef) -> Result<(), Offline> {
            if self.offline {
                return Err(Offline);
            }
            self.resolved.fetch_add(1, Ordering::SeqCst);
            let display = {
                let rows = self.rows.lock().unwrap();
                rows.iter()
                    .find(|r| {
                        r.entity() == reference.entity()
                            && reference
                                .identifiers()
                                .iter()
                                .all(|(k, v)| r.get(k) == Some(v))
                    })
                    .and_then(|r| r.get("email"))
                    .and_then(FieldValue::as_text)
                    .map(str::to_string)
            };
            reference.mark_loaded(display);
            Ok(())
        }
    }

    /// Persisted or pending `user` entity
    struct User {
        id: Option<i64>,
        name: Option<&'static str>,
        email: Option<&'static str>,
    }

    impl Candidate for User {
        fn type_name(&self) -> &str {
            "user"
        }

        fn is_managed(&self) -> bool {
            true
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(self.id.into()),
                "name" => Some(self.name.into()),
                "email" => Some(self.email.into()),
                _ => None,
            }
        }
    }

    /// Managed subtype stored in the `user` table
    struct Admin(User);

    impl Candidate for Admin {
        fn type_name(&self) -> &str {
            "admin"
        }

        fn is_managed(&self) -> bool {
            true
        }

        fn is_instance_of(&self, entity: &str) -> bool {
            entity == "admin" || entity == "user"
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            self.0.field(name)
        }
    }

    /// Transient profile update request
    struct ProfileUpdate {
        id: i64,
        email: Option<&'static str>,
    }

    impl Candidate for ProfileUpdate {
        fn type_name(&self) -> &str {
            "ProfileUpdate"
        }

        fn is_managed(&self) -> bool {
            false
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(self.id.into()),
                "email" => Some(self.email.into()),
                "emailAddress" => Some(self.email.into()),
                _ => None,
            }
        }
    }

    struct Certificate {
        id: Option<i64>,
        user: Option<EntityRef>,
        name: &'static str,
    }

    impl Candidate for Certificate {
        fn type_name(&self) -> &str {
            "certificate"
        }

        fn is_managed(&self) -> bool {
            true
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(self.id.into()),
                "user" => Some(self.user.clone().into()),
                "name" => Some(self.name.into()),
                _ => None,
            }
        }
    }

    fn user_row(id: i64, name: &str, email: &str) -> Record {
        Record::new("user")
            .with("id", id)
            .with("name", name)
            .with("email", email)
    }

    fn validator(rows: Vec<Record>) -> (UniqueEntityValidator<MemoryGateway>, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new(rows));
        (UniqueEntityValidator::new(Arc::clone(&gateway)), gateway)
    }

    fn new_user(email: &'static str) -> User {
        User {
            id: None,
            name: Some("Ada"),
            email: Some(email),
        }
    }

    #[test]
    fn test_empty_field_set_is_rejected() {
        let err = UniqueConstraint::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyFieldSet);
    }

    #[tokio::test]
    async fn test_no_matching_row_passes() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();

        let outcome = validator
            .validate(&new_user("b@x.com"), &constraint)
            .await
            .unwrap();
        assert!(outcome.is_unique());
    }

    #[tokio::test]
    async fn test_new_candidate_with_taken_value_fails() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();

        let outcome = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "email");
        assert_eq!(violation.invalid_value, FieldValue::from("a@x.com"));
        assert_eq!(violation.display_value, "\"a@x.com\"");
        assert_eq!(violation.message, DEFAULT_MESSAGE);
        assert_eq!(violation.code, NOT_UNIQUE_ERROR);
        assert_eq!(violation.cause.len(), 1);
    }

    #[tokio::test]
    async fn test_persisted_candidate_does_not_collide_with_itself() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();
        let persisted = User {
            id: Some(1),
            name: Some("Ada"),
            email: Some("a@x.com"),
        };

        let outcome = validator.validate(&persisted, &constraint).await.unwrap();
        assert!(outcome.is_unique());
    }

    #[tokio::test]
    async fn test_other_persisted_row_collides() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();
        let other = User {
            id: Some(2),
            name: Some("Bob"),
            email: Some("a@x.com"),
        };

        let outcome = validator.validate(&other, &constraint).await.unwrap();
        assert!(!outcome.is_unique());
    }

    #[tokio::test]
    async fn test_composite_fields_must_all_match() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["name", "email"]).unwrap();

        let same_email_other_name = User {
            id: None,
            name: Some("Bob"),
            email: Some("a@x.com"),
        };
        let outcome = validator
            .validate(&same_email_other_name, &constraint)
            .await
            .unwrap();
        assert!(outcome.is_unique());

        let outcome = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap();
        assert_eq!(outcome.violation().unwrap().path, "name");
    }

    #[tokio::test]
    async fn test_error_path_overrides_first_field() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["name", "email"])
            .unwrap()
            .error_path("email");

        let outcome = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "email");
        assert_eq!(violation.invalid_value, FieldValue::from("a@x.com"));
    }

    #[tokio::test]
    async fn test_unknown_error_path_reports_first_value() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"])
            .unwrap()
            .error_path("contact");

        let outcome = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "contact");
        assert_eq!(violation.invalid_value, FieldValue::from("a@x.com"));
    }

    #[tokio::test]
    async fn test_ignore_null_passes_without_query() {
        let (validator, gateway) = validator(vec![Record::new("user").with("id", 1i64)]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();
        let candidate = User {
            id: None,
            name: None,
            email: None,
        };

        let outcome = validator.validate(&candidate, &constraint).await.unwrap();
        assert!(outcome.is_unique());
        assert_eq!(gateway.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_null_is_compared_when_not_ignored() {
        let (validator, _) = validator(vec![Record::new("user").with("id", 1i64)]);
        let constraint = UniqueConstraint::new(["email"])
            .unwrap()
            .ignore_null(false);
        let candidate = User {
            id: None,
            name: None,
            email: None,
        };

        let outcome = validator.validate(&candidate, &constraint).await.unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.invalid_value, FieldValue::Null);
        assert_eq!(violation.display_value, "null");
    }

    #[tokio::test]
    async fn test_many_matches_always_fail() {
        let rows = vec![user_row(1, "Ada", "a@x.com"), user_row(2, "Ada", "b@x.com")];
        for strategy in [MatchStrategy::Bounded, MatchStrategy::Exact] {
            let (validator, _) = validator(rows.clone());
            let constraint = UniqueConstraint::new(["name"])
                .unwrap()
                .strategy(strategy);
            let persisted = User {
                id: Some(1),
                name: Some("Ada"),
                email: Some("a@x.com"),
            };

            let outcome = validator.validate(&persisted, &constraint).await.unwrap();
            assert_eq!(outcome.violation().unwrap().cause.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_strategy_limits() {
        let (validator, gateway) = validator(vec![]);
        let bounded = UniqueConstraint::new(["email"]).unwrap();
        validator
            .validate(&new_user("a@x.com"), &bounded)
            .await
            .unwrap();
        assert_eq!(*gateway.last_limit.lock().unwrap(), Some(Some(2)));

        let exact = bounded.strategy(MatchStrategy::Exact);
        validator
            .validate(&new_user("a@x.com"), &exact)
            .await
            .unwrap();
        assert_eq!(*gateway.last_limit.lock().unwrap(), Some(None));
    }

    #[tokio::test]
    async fn test_unmapped_field_is_configuration_error() {
        let (validator, _) = validator(vec![]);
        let constraint = UniqueConstraint::new(["nonexistentField"]).unwrap();

        let err = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::UnmappedField { ref field, .. })
                if field == "nonexistentField"
        ));
    }

    #[tokio::test]
    async fn test_missing_property_is_configuration_error() {
        let (validator, _) = validator(vec![]);
        let constraint = UniqueConstraint::new(["surname"]).unwrap();

        let err = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::MissingProperty { .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_update_of_same_row_passes() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"])
            .unwrap()
            .entity("user")
            .identifier_field_names(["id"]);

        let own = ProfileUpdate {
            id: 1,
            email: Some("a@x.com"),
        };
        let outcome = validator.validate(&own, &constraint).await.unwrap();
        assert!(outcome.is_unique());

        let other = ProfileUpdate {
            id: 2,
            email: Some("a@x.com"),
        };
        let outcome = validator.validate(&other, &constraint).await.unwrap();
        assert_eq!(outcome.violation().unwrap().path, "email");
    }

    #[tokio::test]
    async fn test_transient_without_identifiers_collides() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap().entity("user");
        let own = ProfileUpdate {
            id: 1,
            email: Some("a@x.com"),
        };

        let outcome = validator.validate(&own, &constraint).await.unwrap();
        assert!(!outcome.is_unique());
    }

    #[tokio::test]
    async fn test_mapped_property_names() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::mapped([("emailAddress", "email")])
            .unwrap()
            .entity("user");
        let update = ProfileUpdate {
            id: 5,
            email: Some("a@x.com"),
        };

        let outcome = validator.validate(&update, &constraint).await.unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "email");
        assert_eq!(violation.invalid_value, FieldValue::from("a@x.com"));

        let at_property = constraint.error_path("emailAddress");
        let outcome = validator.validate(&update, &at_property).await.unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "emailAddress");
        assert_eq!(violation.invalid_value, FieldValue::from("a@x.com"));
    }

    #[tokio::test]
    async fn test_identifier_names_must_match_metadata() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"])
            .unwrap()
            .entity("user")
            .identifier_field_names(["email"]);
        let update = ProfileUpdate {
            id: 1,
            email: Some("a@x.com"),
        };

        let err = validator.validate(&update, &constraint).await.unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::IdentifierMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_entity_override_accepts_subtype() {
        let (validator, _) = validator(vec![user_row(1, "Ada", "a@x.com")]);
        let constraint = UniqueConstraint::new(["email"]).unwrap().entity("user");

        let outcome = validator
            .validate(&Admin(new_user("a@x.com")), &constraint)
            .await
            .unwrap();
        assert!(!outcome.is_unique());
    }

    #[tokio::test]
    async fn test_entity_override_rejects_unrelated_entity() {
        let (validator, _) = validator(vec![]);
        let constraint = UniqueConstraint::new(["name"])
            .unwrap()
            .entity("certificate");

        let err = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::UnsupportedCandidate { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_entity_is_configuration_error() {
        let (validator, _) = validator(vec![]);
        let constraint = UniqueConstraint::new(["email"]).unwrap();

        let err = validator
            .validate(&Admin(new_user("a@x.com")), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::UnknownEntity(ref e)) if e == "admin"
        ));
    }

    #[tokio::test]
    async fn test_association_is_resolved_and_described() {
        let rows = vec![
            user_row(1, "Ada", "a@x.com"),
            Record::new("certificate")
                .with("id", 10i64)
                .with("name", "Rust")
                .with("user", EntityRef::by_id("user", 1)),
        ];
        let (validator, gateway) = validator(rows);
        let constraint = UniqueConstraint::new(["user", "name"])
            .unwrap()
            .error_path("user");
        let candidate = Certificate {
            id: None,
            user: Some(EntityRef::by_id("user", 1)),
            name: "Rust",
        };

        let outcome = validator.validate(&candidate, &constraint).await.unwrap();
        assert_eq!(gateway.resolved.load(Ordering::SeqCst), 1);
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.path, "user");
        assert_eq!(violation.display_value, "a@x.com");
    }

    #[tokio::test]
    async fn test_unresolvable_reference_is_described_by_identifier() {
        let rows = vec![
            Record::new("certificate")
                .with("id", 10i64)
                .with("name", "Rust")
                .with("user", EntityRef::by_id("user", 9)),
        ];
        let (validator, _) = validator(rows);
        let constraint = UniqueConstraint::new(["user", "name"])
            .unwrap()
            .message("{{ value }} already owns this certificate.");
        let candidate = Certificate {
            id: None,
            user: Some(EntityRef::by_id("user", 9)),
            name: "Rust",
        };

        let outcome = validator.validate(&candidate, &constraint).await.unwrap();
        let violation = outcome.violation().unwrap();
        assert_eq!(violation.display_value, "user(id=9)");
        assert_eq!(violation.message, "user(id=9) already owns this certificate.");
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let gateway = Arc::new(MemoryGateway::new(vec![]).offline());
        let validator = UniqueEntityValidator::new(gateway);
        let constraint = UniqueConstraint::new(["email"]).unwrap();

        let err = validator
            .validate(&new_user("a@x.com"), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(err, UniqueError::Storage(Offline)));
        assert_eq!(err.to_string(), "Storage unavailable: connection refused");
    }
}
