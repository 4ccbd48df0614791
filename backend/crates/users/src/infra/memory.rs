//! In-memory store
//!
//! Same contract as the PostgreSQL store, unique indexes included. Backs the
//! router tests and local runs without a database.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use kernel::id::{CertificateId, UserId};
use kernel::validation::{
    Candidate, Criteria, DEFAULT_MESSAGE, EntityCatalog, EntityMetadata, EntityRef, FieldValue,
    ObjectGateway, Record,
};
use tokio::sync::RwLock;

use crate::domain::entity::{Certificate, User};
use crate::domain::repository::{CertificateRepository, UserRepository};
use crate::domain::schema;
use crate::domain::value_object::email::Email;
use crate::error::{UserError, UserResult};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    certificates: BTreeMap<i64, Certificate>,
    last_user_id: i64,
    last_certificate_id: i64,
}

impl State {
    /// Path of the first unique index `user` would collide on
    fn user_conflict(&self, user: &User) -> Option<&'static str> {
        let others: Vec<&User> = self
            .users
            .values()
            .filter(|other| user.id.is_none() || other.id != user.id)
            .collect();

        if others.iter().any(|other| other.name == user.name) {
            Some("name")
        } else if others.iter().any(|other| other.surname == user.surname) {
            Some("surname")
        } else if others.iter().any(|other| other.email == user.email) {
            Some("email")
        } else {
            None
        }
    }

    fn certificate_conflict(&self, certificate: &Certificate) -> bool {
        certificate.user_id.is_some()
            && self.certificates.values().any(|other| {
                other.user_id == certificate.user_id && other.name == certificate.name
            })
    }

    /// Snapshot of every row of `metadata`'s entity
    fn records(&self, metadata: &EntityMetadata) -> Vec<Record> {
        match metadata.name() {
            schema::USER => self.users.values().map(|u| to_record(u, metadata)).collect(),
            schema::CERTIFICATE => self
                .certificates
                .values()
                .map(|c| to_record(c, metadata))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn to_record<C: Candidate>(row: &C, metadata: &EntityMetadata) -> Record {
    metadata
        .fields()
        .iter()
        .fold(Record::new(metadata.name()), |record, spec| {
            let value = row.field(&spec.name).unwrap_or(FieldValue::Null);
            record.with(spec.name.as_str(), value)
        })
}

/// Users and certificates kept in process memory
#[derive(Clone)]
pub struct InMemoryUsersStore {
    state: Arc<RwLock<State>>,
    catalog: Arc<EntityCatalog>,
}

impl InMemoryUsersStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            catalog: Arc::new(schema::catalog()),
        }
    }
}

impl Default for InMemoryUsersStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryUsersStore {
    async fn create(&self, user: &User) -> UserResult<User> {
        let mut state = self.state.write().await;

        let mut created = user.clone();
        created.id = None;
        if let Some(path) = state.user_conflict(&created) {
            return Err(UserError::field(path, DEFAULT_MESSAGE));
        }

        state.last_user_id += 1;
        let id = state.last_user_id;
        created.id = Some(UserId::new(id));
        created.certificates.clear();
        state.users.insert(id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, user_id: UserId) -> UserResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id.get()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| &u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> UserResult<()> {
        let user_id = user
            .id
            .ok_or_else(|| UserError::Internal("cannot update an unsaved user".to_string()))?;
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user_id.get()) {
            return Err(UserError::UserNotFound);
        }
        if let Some(path) = state.user_conflict(user) {
            return Err(UserError::field(path, DEFAULT_MESSAGE));
        }

        let mut stored = user.clone();
        stored.certificates.clear();
        state.users.insert(user_id.get(), stored);

        Ok(())
    }
}

impl CertificateRepository for InMemoryUsersStore {
    async fn create(&self, certificate: &Certificate) -> UserResult<Certificate> {
        let mut state = self.state.write().await;

        if state.certificate_conflict(certificate) {
            return Err(UserError::field("name", DEFAULT_MESSAGE));
        }

        state.last_certificate_id += 1;
        let id = state.last_certificate_id;
        let mut created = certificate.clone();
        created.id = Some(CertificateId::new(id));
        state.certificates.insert(id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, certificate_id: CertificateId) -> UserResult<Option<Certificate>> {
        let state = self.state.read().await;
        Ok(state.certificates.get(&certificate_id.get()).cloned())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> UserResult<Vec<Certificate>> {
        let state = self.state.read().await;
        Ok(state
            .certificates
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, certificate_id: CertificateId) -> UserResult<()> {
        self.state
            .write()
            .await
            .certificates
            .remove(&certificate_id.get())
            .map(|_| ())
            .ok_or(UserError::CertificateNotFound)
    }
}

impl ObjectGateway for InMemoryUsersStore {
    type Error = Infallible;

    fn metadata(&self, entity: &str) -> Option<&EntityMetadata> {
        self.catalog.get(entity)
    }

    async fn find_matching(
        &self,
        entity: &str,
        criteria: &Criteria,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, Infallible> {
        let Some(metadata) = self.catalog.get(entity) else {
            return Ok(Vec::new());
        };

        let state = self.state.read().await;
        Ok(state
            .records(metadata)
            .into_iter()
            .filter(|record| criteria.matches(record))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn resolve(&self, reference: &mut EntityRef) -> Result<(), Infallible> {
        if reference.is_loaded() {
            return Ok(());
        }
        let Some(metadata) = self.catalog.get(reference.entity()) else {
            reference.mark_loaded(None);
            return Ok(());
        };

        let mut criteria = Criteria::new();
        for (field, value) in reference.identifiers() {
            criteria.insert(field.as_str(), value.clone());
        }

        let display = self
            .state
            .read()
            .await
            .records(metadata)
            .iter()
            .find(|record| criteria.matches(record))
            .and_then(|record| record.to_ref(metadata).display().map(str::to_string));
        reference.mark_loaded(display);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kernel::validation::{
        ConfigurationError, UniqueConstraint, UniqueEntityValidator, UniqueError,
    };
    use platform::password::ClearTextPassword;

    use super::*;
    use crate::domain::value_object::{person_name::PersonName, user_password::UserPassword};

    fn user(name: &str, surname: &str, email: &str) -> User {
        let password = ClearTextPassword::new("secret".to_string()).unwrap();
        User::new(
            PersonName::new(name).unwrap(),
            PersonName::new(surname).unwrap(),
            Email::new(email).unwrap(),
            UserPassword::from_clear(&password, None).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = InMemoryUsersStore::new();
        let a = UserRepository::create(&store, &user("Ada", "Lovelace", "ada@x.com")).await.unwrap();
        let b = UserRepository::create(&store, &user("Alan", "Turing", "alan@x.com")).await.unwrap();

        assert_eq!(a.id, Some(UserId::new(1)));
        assert_eq!(b.id, Some(UserId::new(2)));
        let found = store.find_by_email(&Email::new("ada@x.com").unwrap()).await.unwrap();
        assert_eq!(found.unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_unique_indexes_enforced() {
        let store = InMemoryUsersStore::new();
        UserRepository::create(&store, &user("Ada", "Lovelace", "ada@x.com")).await.unwrap();

        let err = UserRepository::create(&store, &user("Grace", "Hopper", "ada@x.com"))
            .await
            .unwrap_err();
        let UserError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("email"), Some(DEFAULT_MESSAGE));
    }

    #[tokio::test]
    async fn test_update_keeps_own_row_out_of_conflicts() {
        let store = InMemoryUsersStore::new();
        let mut ada = UserRepository::create(&store, &user("Ada", "Lovelace", "ada@x.com")).await.unwrap();

        ada.is_active = false;
        store.update(&ada).await.unwrap();

        let stored = UserRepository::find_by_id(&store, UserId::new(1)).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_gateway_matches_certificates_by_owner() {
        let store = InMemoryUsersStore::new();
        UserRepository::create(&store, &user("Ada", "Lovelace", "ada@x.com")).await.unwrap();
        let mut certificate = Certificate::new("Rust".to_string(), 10);
        certificate.user_id = Some(UserId::new(1));
        CertificateRepository::create(&store, &certificate).await.unwrap();

        let mut owner = EntityRef::by_id(schema::USER, 1);
        store.resolve(&mut owner).await.unwrap();
        assert_eq!(owner.display(), Some("ada@x.com"));

        let mut criteria = Criteria::new();
        criteria.insert("user", FieldValue::Ref(owner));
        criteria.insert("name", "Rust".into());
        let rows = store
            .find_matching(schema::CERTIFICATE, &criteria, Some(2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        criteria.insert("user", FieldValue::Ref(EntityRef::by_id(schema::USER, 2)));
        let rows = store
            .find_matching(schema::CERTIFICATE, &criteria, Some(2))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_new_user_checked_against_foreign_entity_is_rejected() {
        let validator = UniqueEntityValidator::new(Arc::new(InMemoryUsersStore::new()));
        let constraint = UniqueConstraint::new(["name"])
            .unwrap()
            .entity(schema::CERTIFICATE);

        let err = validator
            .validate(&user("Ada", "Lovelace", "ada@x.com"), &constraint)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UniqueError::Configuration(ConfigurationError::UnsupportedCandidate { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsaved_user_collides_with_stored_row() {
        let store = Arc::new(InMemoryUsersStore::new());
        UserRepository::create(store.as_ref(), &user("Ada", "Lovelace", "ada@x.com"))
            .await
            .unwrap();
        let validator = UniqueEntityValidator::new(Arc::clone(&store));
        let constraint = UniqueConstraint::new(["email"]).unwrap();

        let outcome = validator
            .validate(&user("Grace", "Hopper", "ada@x.com"), &constraint)
            .await
            .unwrap();
        assert_eq!(outcome.violation().unwrap().path, "email");

        let saved = UserRepository::find_by_id(store.as_ref(), UserId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert!(validator.validate(&saved, &constraint).await.unwrap().is_unique());
    }

    #[tokio::test]
    async fn test_delete_missing_certificate() {
        let store = InMemoryUsersStore::new();
        let err = store.delete(CertificateId::new(9)).await.unwrap_err();
        assert!(matches!(err, UserError::CertificateNotFound));
    }
}
