//! Persisted entity metadata for uniqueness checks
//!
//! Field names are the ones [`Candidate`](kernel::validation::Candidate)
//! implementations expose; columns are the SQL names in
//! `database/migrations`.

use kernel::validation::{EntityCatalog, EntityMetadata};

pub const USER: &str = "user";
pub const CERTIFICATE: &str = "certificate";
/// Custom column type of `users.role`
pub const ROLE_TYPE: &str = "role";

pub fn catalog() -> EntityCatalog {
    EntityCatalog::new()
        .with(
            EntityMetadata::new(USER, "users")
                .field("id", "id")
                .field("name", "name")
                .field("surname", "surname")
                .field("email", "email")
                .custom_field("role", "role", ROLE_TYPE)
                .field("is_active", "is_active")
                .identifier(["id"])
                .display_field("email"),
        )
        .with(
            EntityMetadata::new(CERTIFICATE, "certificate")
                .field("id", "id")
                .field("name", "name")
                .field("price", "price")
                .association("user", "user_id", USER)
                .identifier(["id"]),
        )
}
