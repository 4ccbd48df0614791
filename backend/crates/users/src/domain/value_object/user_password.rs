//! User Password Value Object
//!
//! Delegates to `platform::password` for hashing and verification.
//! Stored in `users.password` as an Argon2id PHC string.

use platform::password::{ClearTextPassword, HashedPassword, PasswordHashError};
use std::fmt;

/// Hashed user password for database storage
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a validated clear text password
    pub fn from_clear(
        clear: &ClearTextPassword,
        pepper: Option<&[u8]>,
    ) -> Result<Self, PasswordHashError> {
        clear.hash(pepper).map(Self)
    }

    /// Create from PHC string (from database)
    pub fn from_db(phc_string: impl Into<String>) -> Result<Self, PasswordHashError> {
        HashedPassword::from_phc_string(phc_string).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_phc_string()
    }

    /// `pepper` must match the one used during hashing
    pub fn verify(&self, clear: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(clear, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
