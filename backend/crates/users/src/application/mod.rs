//! Application Layer
//!
//! Use cases and application services.

pub mod certificates;
pub mod config;
pub mod current_user;
pub(crate) mod input;
pub mod register;
pub mod sign_in;
pub mod update_profile;

// Re-exports
pub use certificates::{CertificatesUseCase, PurchaseInput};
pub use config::UsersConfig;
pub use current_user::CurrentUserUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use update_profile::{UpdateProfileInput, UpdateProfileUseCase};
