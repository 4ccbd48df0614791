//! Infrastructure Layer
//!
//! Database implementations.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUsersStore;
pub use postgres::PgUsersRepository;
