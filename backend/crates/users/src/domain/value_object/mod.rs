//! Value Object Module

pub mod email;
pub mod person_name;
pub mod role;
pub mod user_password;

use thiserror::Error;

/// Input rule violations; the messages are shown to API clients as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("This value should not be blank.")]
    Blank,

    #[error("This value is too long. It should have {max} characters or less.")]
    TooLong { max: usize },

    #[error("This value is not a valid email address.")]
    InvalidEmail,

    #[error("This value should be either positive or zero.")]
    Negative,
}
