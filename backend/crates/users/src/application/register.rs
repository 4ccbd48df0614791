//! Register Use Case
//!
//! Creates a new user account.

use std::sync::Arc;

use kernel::error::app_error::FieldErrors;
use kernel::id::UserId;
use kernel::validation::{
    Candidate, FieldValue, ObjectGateway, UniqueConstraint, UniqueEntityValidator,
};
use platform::password::ClearTextPassword;

use crate::application::config::UsersConfig;
use crate::application::input::{check_unique, finish, required};
use crate::domain::entity::User;
use crate::domain::repository::UserRepository;
use crate::domain::schema;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, user_password::UserPassword,
};
use crate::error::{UserError, UserResult};

/// Register input; absent fields are reported as blank
#[derive(Debug, Default)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Register output
pub struct RegisterOutput {
    pub user_id: UserId,
}

/// The submitted form, checked against persisted users
struct Registration<'a> {
    email: Option<&'a Email>,
}

impl Candidate for Registration<'_> {
    fn type_name(&self) -> &str {
        "registration"
    }

    fn is_managed(&self) -> bool {
        false
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "email" => Some(self.email.map(Email::as_str).into()),
            _ => None,
        }
    }
}

/// Register use case
pub struct RegisterUseCase<U, G>
where
    U: UserRepository,
    G: ObjectGateway,
{
    user_repo: Arc<U>,
    validator: UniqueEntityValidator<G>,
    config: Arc<UsersConfig>,
}

impl<U, G> RegisterUseCase<U, G>
where
    U: UserRepository,
    G: ObjectGateway,
    G::Error: Into<UserError>,
{
    pub fn new(user_repo: Arc<U>, validator: UniqueEntityValidator<G>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            validator,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> UserResult<RegisterOutput> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", input.name, PersonName::new);
        let surname = required(&mut errors, "surname", input.surname, PersonName::new);
        let email = required(&mut errors, "email", input.email, Email::new);
        let password = required(&mut errors, "password", input.password, ClearTextPassword::new);

        let constraint = UniqueConstraint::new(["email"])?.entity(schema::USER);
        check_unique(
            &self.validator,
            &Registration {
                email: email.as_ref(),
            },
            &constraint,
            &mut errors,
        )
        .await?;

        finish(errors)?;
        let (Some(name), Some(surname), Some(email), Some(password)) =
            (name, surname, email, password)
        else {
            return Err(UserError::Internal("field check passed without values".to_string()));
        };

        let password = UserPassword::from_clear(&password, self.config.pepper())?;
        let user = self
            .user_repo
            .create(&User::new(name, surname, email, password))
            .await?;
        let user_id = user
            .id
            .ok_or_else(|| UserError::Internal("created user has no id".to_string()))?;

        tracing::info!(user_id = %user_id, email = %user.email, "User registered");

        Ok(RegisterOutput { user_id })
    }
}
