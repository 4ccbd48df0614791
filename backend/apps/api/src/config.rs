//! Server configuration from the environment

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;
use platform::jwt::JwtConfig;
use users::UsersConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_JWT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub frontend_origins: Vec<String>,
    pub users: UsersConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `lookup` returns the raw value of a variable, if set
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let mut users = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => UsersConfig {
                jwt: JwtConfig {
                    secret,
                    ..Default::default()
                },
                ..Default::default()
            },
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using a random secret");
                UsersConfig::with_random_secret()
            }
            None => bail!("JWT_SECRET must be set in production"),
        };

        let ttl_secs = match lookup("JWT_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .context("JWT_TTL_SECS must be a positive number of seconds")?,
            None => DEFAULT_JWT_TTL_SECS,
        };
        users = users.with_token_ttl(Duration::seconds(ttl_secs));

        if let Some(issuer) = lookup("JWT_ISSUER") {
            users.jwt.issuer = issuer;
        }
        users.password_pepper = lookup("PASSWORD_PEPPER")
            .filter(|p| !p.is_empty())
            .map(String::into_bytes);

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            frontend_origins,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/app"), ("JWT_SECRET", "s")]).unwrap();

        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.frontend_origins.len(), 2);
        assert_eq!(config.users.jwt.secret, "s");
        assert_eq!(config.users.jwt.ttl, Duration::seconds(DEFAULT_JWT_TTL_SECS));
        assert!(config.users.pepper().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("FRONTEND_ORIGINS", "https://shop.example.com, "),
            ("JWT_SECRET", "secret"),
            ("JWT_TTL_SECS", "60"),
            ("JWT_ISSUER", "shop"),
            ("PASSWORD_PEPPER", "pepper"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.frontend_origins, ["https://shop.example.com"]);
        assert_eq!(config.users.jwt.ttl, Duration::seconds(60));
        assert_eq!(config.users.jwt.issuer, "shop");
        assert_eq!(config.users.pepper(), Some(&b"pepper"[..]));
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("JWT_SECRET", "s")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("JWT_SECRET", "s"), ("JWT_TTL_SECS", "-5")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("JWT_SECRET", "s"), ("BIND_ADDR", "nowhere")]).is_err());
    }
}
