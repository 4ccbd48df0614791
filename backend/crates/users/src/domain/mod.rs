//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the schema
//! catalog used by uniqueness checks.

pub mod entity;
pub mod repository;
pub mod schema;
pub mod value_object;

// Re-exports
pub use entity::{Certificate, User};
pub use repository::{CertificateRepository, UserRepository};
