//! Certificate Entity

use kernel::id::{CertificateId, UserId};
use kernel::validation::{Candidate, EntityRef, FieldValue};

use crate::domain::schema;

/// A purchased certificate, owned by at most one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: Option<CertificateId>,
    pub user_id: Option<UserId>,
    pub name: String,
    pub price: i32,
}

impl Certificate {
    pub fn new(name: String, price: i32) -> Self {
        Self {
            id: None,
            user_id: None,
            name,
            price,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

impl Candidate for Certificate {
    fn type_name(&self) -> &str {
        schema::CERTIFICATE
    }

    /// Managed from construction on; an unsaved one has a null `id`
    fn is_managed(&self) -> bool {
        true
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "id" => self.id.map(|id| id.get()).into(),
            "user" => self
                .user_id
                .map(|owner| EntityRef::by_id(schema::USER, owner.get()))
                .into(),
            "name" => self.name.as_str().into(),
            "price" => self.price.into(),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_a_reference() {
        let mut certificate = Certificate::new("Rust".to_string(), 10);
        assert_eq!(certificate.field("user"), Some(FieldValue::Null));

        certificate.user_id = Some(UserId::new(4));
        assert!(certificate.is_owned_by(UserId::new(4)));
        assert_eq!(
            certificate.field("user"),
            Some(FieldValue::Ref(EntityRef::by_id("user", 4)))
        );
        assert_eq!(certificate.field("price"), Some(FieldValue::Int(10)));
    }
}
