//! Entity Module

pub mod certificate;
pub mod user;

pub use certificate::Certificate;
pub use user::User;
