//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::UsersAppState;
pub use middleware::{AuthenticatedUser, require_bearer};
pub use router::{users_router, users_router_generic};
