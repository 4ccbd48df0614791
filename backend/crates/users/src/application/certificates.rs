//! Certificate Use Cases
//!
//! Purchase, list and remove certificates of the authenticated user.

use std::sync::Arc;

use kernel::error::app_error::FieldErrors;
use kernel::id::{CertificateId, UserId};
use kernel::validation::{ObjectGateway, UniqueConstraint, UniqueEntityValidator};

use crate::application::input::{check_unique, finish, required};
use crate::domain::entity::Certificate;
use crate::domain::repository::CertificateRepository;
use crate::domain::value_object::ValueError;
use crate::error::{UserError, UserResult};

/// Column width of `certificate.name`
const CERTIFICATE_NAME_MAX_LENGTH: usize = 255;

/// Purchase input
#[derive(Debug, Default)]
pub struct PurchaseInput {
    pub name: Option<String>,
    pub price: Option<i32>,
}

fn certificate_name(raw: String) -> Result<String, ValueError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValueError::Blank);
    }
    if name.chars().count() > CERTIFICATE_NAME_MAX_LENGTH {
        return Err(ValueError::TooLong {
            max: CERTIFICATE_NAME_MAX_LENGTH,
        });
    }
    Ok(name.to_string())
}

fn price(errors: &mut FieldErrors, price: Option<i32>) -> Option<i32> {
    match price {
        None => errors.add("price", ValueError::Blank.to_string()),
        Some(p) if p < 0 => errors.add("price", ValueError::Negative.to_string()),
        Some(p) => return Some(p),
    }
    None
}

/// Certificate use cases
pub struct CertificatesUseCase<C, G>
where
    C: CertificateRepository,
    G: ObjectGateway,
{
    certificate_repo: Arc<C>,
    validator: UniqueEntityValidator<G>,
}

impl<C, G> CertificatesUseCase<C, G>
where
    C: CertificateRepository,
    G: ObjectGateway,
    G::Error: Into<UserError>,
{
    pub fn new(certificate_repo: Arc<C>, validator: UniqueEntityValidator<G>) -> Self {
        Self {
            certificate_repo,
            validator,
        }
    }

    /// A user owns at most one certificate of a given name
    pub async fn purchase(&self, user_id: UserId, input: PurchaseInput) -> UserResult<Certificate> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", input.name, certificate_name);
        let price = price(&mut errors, input.price);

        // Nothing to compare against without a name
        if let Some(name) = &name {
            let mut candidate = Certificate::new(name.clone(), price.unwrap_or_default());
            candidate.user_id = Some(user_id);

            let constraint = UniqueConstraint::new(["user", "name"])?.error_path("name");
            check_unique(&self.validator, &candidate, &constraint, &mut errors).await?;
        }

        finish(errors)?;
        let (Some(name), Some(price)) = (name, price) else {
            return Err(UserError::Internal("field check passed without values".to_string()));
        };

        let mut certificate = Certificate::new(name, price);
        certificate.user_id = Some(user_id);
        let certificate = self.certificate_repo.create(&certificate).await?;

        tracing::info!(
            user_id = %user_id,
            certificate_id = ?certificate.id.map(|id| id.get()),
            "Certificate purchased"
        );

        Ok(certificate)
    }

    pub async fn list(&self, user_id: UserId) -> UserResult<Vec<Certificate>> {
        self.certificate_repo.find_by_user_id(user_id).await
    }

    /// Certificates of other users are reported as not found
    pub async fn remove(&self, user_id: UserId, certificate_id: CertificateId) -> UserResult<()> {
        self.certificate_repo
            .find_by_id(certificate_id)
            .await?
            .filter(|certificate| certificate.is_owned_by(user_id))
            .ok_or(UserError::CertificateNotFound)?;

        self.certificate_repo.delete(certificate_id).await?;

        tracing::info!(user_id = %user_id, certificate_id = %certificate_id, "Certificate removed");

        Ok(())
    }
}
