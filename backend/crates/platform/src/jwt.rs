//! JWT access tokens (HS256)
//!
//! Stateless: validation needs only the shared secret, no storage lookup.
//! Claims carry the user id as `sub` and the login name (email) as
//! `username`; nothing secret goes into a token.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token generation failed: {0}")]
    Encoding(String),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
    pub iss: String,
}

impl JwtClaims {
    /// `sub` parsed as a numeric user id
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub.parse().map_err(|_| JwtError::Invalid)
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret (at least 32 bytes recommended)
    pub secret: String,
    pub ttl: Duration,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl: Duration::hours(1),
            issuer: "certificate-shop".to_string(),
        }
    }
}

/// Issues and validates access tokens
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.ttl).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("ttl", &self.config.ttl)
            .finish_non_exhaustive()
    }
}
