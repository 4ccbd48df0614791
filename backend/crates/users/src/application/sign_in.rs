//! Sign In Use Case
//!
//! Authenticates a user by email and password and issues an access token.

use std::sync::{Arc, LazyLock};

use kernel::error::app_error::FieldErrors;
use platform::jwt::JwtManager;
use platform::password::{ClearTextPassword, HashedPassword};

use crate::application::config::UsersConfig;
use crate::application::input::{finish, required};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{UserError, UserResult};

/// Verified against when the email is unknown, so that path also costs
/// one argon2 run
static UNKNOWN_USER_HASH: LazyLock<Option<HashedPassword>> = LazyLock::new(|| {
    ClearTextPassword::new("unknown-user".to_string())
        .ok()?
        .hash(None)
        .ok()
});

/// Sign in input
#[derive(Debug, Default)]
pub struct SignInInput {
    /// Login email
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Sign in output
pub struct SignInOutput {
    pub token: String,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    jwt: Arc<JwtManager>,
    config: Arc<UsersConfig>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, jwt: Arc<JwtManager>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            jwt,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> UserResult<SignInOutput> {
        let mut errors = FieldErrors::new();
        let email = required(&mut errors, "username", input.username, Email::new);
        let password = required(&mut errors, "password", input.password, ClearTextPassword::new);
        finish(errors)?;
        let (Some(email), Some(password)) = (email, password) else {
            return Err(UserError::InvalidCredentials);
        };

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            if let Some(hash) = UNKNOWN_USER_HASH.as_ref() {
                let _ = hash.verify(&password, self.config.pepper());
            }
            return Err(UserError::InvalidCredentials);
        };

        if !user.password.verify(&password, self.config.pepper()) {
            return Err(UserError::InvalidCredentials);
        }

        // Only reported once the password matched
        if !user.can_login() {
            return Err(UserError::AccountDisabled);
        }

        let user_id = user
            .id
            .ok_or_else(|| UserError::Internal("stored user has no id".to_string()))?;
        let token = self.jwt.issue(user_id.get(), user.email.as_str())?;

        tracing::info!(user_id = %user_id, "User signed in");

        Ok(SignInOutput { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryUsersStore;

    fn use_case(store: InMemoryUsersStore) -> SignInUseCase<InMemoryUsersStore> {
        let config = UsersConfig::with_random_secret();
        let jwt = Arc::new(JwtManager::new(config.jwt.clone()));
        SignInUseCase::new(Arc::new(store), jwt, Arc::new(config))
    }

    #[test]
    fn test_unknown_user_hash_is_available() {
        let hash = UNKNOWN_USER_HASH.as_ref().unwrap();
        let other = ClearTextPassword::new("secret".to_string()).unwrap();
        assert!(!hash.verify(&other, None));
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let err = use_case(InMemoryUsersStore::new())
            .execute(SignInInput {
                username: Some("nobody@x.com".to_string()),
                password: Some("secret".to_string()),
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, UserError::InvalidCredentials));
    }
}
