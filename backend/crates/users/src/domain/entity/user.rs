//! User Entity
//!
//! Account holder; owns the certificates it bought.

use kernel::id::UserId;
use kernel::validation::{Candidate, FieldValue};

use crate::domain::entity::certificate::Certificate;
use crate::domain::schema;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, role::Role, user_password::UserPassword,
};

/// User entity
///
/// `id` is `None` until the row has been inserted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<UserId>,
    pub name: PersonName,
    pub surname: PersonName,
    pub password: UserPassword,
    /// Unique; doubles as the login name
    pub email: Email,
    pub role: Role,
    pub is_active: bool,
    /// Filled only by reads that need them
    pub certificates: Vec<Certificate>,
}

impl User {
    /// New, not yet persisted, active user
    pub fn new(name: PersonName, surname: PersonName, email: Email, password: UserPassword) -> Self {
        Self {
            id: None,
            name,
            surname,
            password,
            email,
            role: Role::default(),
            is_active: true,
            certificates: Vec::new(),
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Attach a certificate and make this user its owner
    ///
    /// A certificate with the same id is only attached once.
    pub fn add_certificate(&mut self, mut certificate: Certificate) {
        if certificate.id.is_some()
            && self
                .certificates
                .iter()
                .any(|owned| owned.id == certificate.id)
        {
            return;
        }

        certificate.user_id = self.id;
        self.certificates.push(certificate);
    }

    /// Detach a certificate; the detached copy has no owner
    pub fn remove_certificate(&mut self, certificate: &Certificate) -> Option<Certificate> {
        let index = self
            .certificates
            .iter()
            .position(|owned| owned.id.is_some() && owned.id == certificate.id)?;

        let mut removed = self.certificates.remove(index);
        removed.user_id = None;
        Some(removed)
    }
}

impl Candidate for User {
    fn type_name(&self) -> &str {
        schema::USER
    }

    /// Managed from construction on; an unsaved one has a null `id`
    fn is_managed(&self) -> bool {
        true
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "id" => self.id.map(|id| id.get()).into(),
            "name" => self.name.as_str().into(),
            "surname" => self.surname.as_str().into(),
            "email" => self.email.as_str().into(),
            "role" => self.role.into(),
            "is_active" => self.is_active.into(),
            _ => return None,
        };
        Some(value)
    }
}
