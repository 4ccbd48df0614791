//! Users Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, schema catalog
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration with field-level validation errors
//! - Email + password login issuing a JWT access token
//! - Profile view and update for the token holder
//! - Certificate purchase, listing and removal
//!
//! Duplicate emails and certificate names are caught before writing by
//! `kernel::validation::UniqueEntityValidator`, and at commit time by the
//! database's unique indexes; both give the same field error.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::UsersConfig;
pub use error::{UserError, UserResult};
pub use infra::{memory::InMemoryUsersStore, postgres::PgUsersRepository};
pub use presentation::router::{users_router, users_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
