//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use kernel::id::{CertificateId, UserId};

use crate::domain::entity::{Certificate, User};
use crate::domain::value_object::email::Email;
use crate::error::UserResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; returns it with its generated id
    async fn create(&self, user: &User) -> UserResult<User>;

    /// Find user by ID (certificates not loaded)
    async fn find_by_id(&self, user_id: UserId) -> UserResult<Option<User>>;

    /// Find user by login email
    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>>;

    /// Update a persisted user
    async fn update(&self, user: &User) -> UserResult<()>;
}

/// Certificate repository trait
#[trait_variant::make(CertificateRepository: Send)]
pub trait LocalCertificateRepository {
    /// Insert a new certificate; returns it with its generated id
    async fn create(&self, certificate: &Certificate) -> UserResult<Certificate>;

    async fn find_by_id(&self, certificate_id: CertificateId) -> UserResult<Option<Certificate>>;

    /// All certificates owned by a user, oldest first
    async fn find_by_user_id(&self, user_id: UserId) -> UserResult<Vec<Certificate>>;

    async fn delete(&self, certificate_id: CertificateId) -> UserResult<()>;
}
