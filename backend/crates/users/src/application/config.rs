//! Application Configuration
//!
//! Configuration for the users application layer.

use chrono::Duration;
use platform::jwt::JwtConfig;
use rand::{Rng, distr::Alphanumeric};

/// Users application configuration
#[derive(Debug, Clone, Default)]
pub struct UsersConfig {
    /// Access token signing and lifetime
    pub jwt: JwtConfig,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl UsersConfig {
    /// Create config with a random JWT secret (for development)
    ///
    /// Tokens do not survive a restart.
    pub fn with_random_secret() -> Self {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        Self {
            jwt: JwtConfig {
                secret,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.jwt.ttl = ttl;
        self
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
