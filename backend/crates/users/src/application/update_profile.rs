//! Update Profile Use Case
//!
//! Changes name, surname or email of the authenticated user. The submitted
//! form carries the user's id so that re-submitting the current email is
//! not reported as a duplicate.

use std::sync::Arc;

use kernel::error::app_error::FieldErrors;
use kernel::id::UserId;
use kernel::validation::{
    Candidate, FieldValue, ObjectGateway, UniqueConstraint, UniqueEntityValidator,
};

use crate::application::input::{check_unique, finish, optional};
use crate::domain::entity::User;
use crate::domain::repository::UserRepository;
use crate::domain::schema;
use crate::domain::value_object::{email::Email, person_name::PersonName};
use crate::error::{UserError, UserResult};

/// Update profile input; absent fields are left unchanged
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

struct ProfileUpdate<'a> {
    id: UserId,
    email: Option<&'a Email>,
}

impl Candidate for ProfileUpdate<'_> {
    fn type_name(&self) -> &str {
        "profile_update"
    }

    fn is_managed(&self) -> bool {
        false
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.get().into()),
            "email" => Some(self.email.map(Email::as_str).into()),
            _ => None,
        }
    }
}

pub struct UpdateProfileUseCase<U, G>
where
    U: UserRepository,
    G: ObjectGateway,
{
    user_repo: Arc<U>,
    validator: UniqueEntityValidator<G>,
}

impl<U, G> UpdateProfileUseCase<U, G>
where
    U: UserRepository,
    G: ObjectGateway,
    G::Error: Into<UserError>,
{
    pub fn new(user_repo: Arc<U>, validator: UniqueEntityValidator<G>) -> Self {
        Self {
            user_repo,
            validator,
        }
    }

    pub async fn execute(&self, user_id: UserId, input: UpdateProfileInput) -> UserResult<User> {
        let mut errors = FieldErrors::new();

        let name = optional(&mut errors, "name", input.name, PersonName::new);
        let surname = optional(&mut errors, "surname", input.surname, PersonName::new);
        let email = optional(&mut errors, "email", input.email, Email::new);

        let constraint = UniqueConstraint::new(["email"])?
            .entity(schema::USER)
            .identifier_field_names(["id"]);
        check_unique(
            &self.validator,
            &ProfileUpdate {
                id: user_id,
                email: email.as_ref().and_then(Option::as_ref),
            },
            &constraint,
            &mut errors,
        )
        .await?;

        finish(errors)?;

        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;

        if let Some(name) = name.flatten() {
            user.name = name;
        }
        if let Some(surname) = surname.flatten() {
            user.surname = surname;
        }
        if let Some(email) = email.flatten() {
            user.email = email;
        }

        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user_id, "Profile updated");

        Ok(user)
    }
}
