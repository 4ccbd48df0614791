//! Current User Use Case
//!
//! Loads the authenticated user together with their certificates.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::User;
use crate::domain::repository::{CertificateRepository, UserRepository};
use crate::error::{UserError, UserResult};

pub struct CurrentUserUseCase<U, C>
where
    U: UserRepository,
    C: CertificateRepository,
{
    user_repo: Arc<U>,
    certificate_repo: Arc<C>,
}

impl<U, C> CurrentUserUseCase<U, C>
where
    U: UserRepository,
    C: CertificateRepository,
{
    pub fn new(user_repo: Arc<U>, certificate_repo: Arc<C>) -> Self {
        Self {
            user_repo,
            certificate_repo,
        }
    }

    pub async fn execute(&self, user_id: UserId) -> UserResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;

        for certificate in self.certificate_repo.find_by_user_id(user_id).await? {
            user.add_certificate(certificate);
        }

        Ok(user)
    }
}
