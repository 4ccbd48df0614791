//! Request field checks shared by the use cases
//!
//! Every check records its message under the field path instead of
//! failing fast, so a response lists all bad fields at once.

use std::fmt::Display;

use kernel::error::app_error::FieldErrors;
use kernel::validation::{Candidate, ObjectGateway, UniqueConstraint, UniqueEntityValidator};

use crate::domain::value_object::ValueError;
use crate::error::{UserError, UserResult};

/// Parse a required field, recording `Blank` when it is absent
pub(crate) fn required<T, E, F>(
    errors: &mut FieldErrors,
    path: &str,
    raw: Option<String>,
    parse: F,
) -> Option<T>
where
    E: Display,
    F: FnOnce(String) -> Result<T, E>,
{
    let Some(raw) = raw else {
        errors.add(path, ValueError::Blank.to_string());
        return None;
    };
    optional(errors, path, Some(raw), parse).flatten()
}

/// Parse a field that may be left out; `Some(None)` means absent
pub(crate) fn optional<T, E, F>(
    errors: &mut FieldErrors,
    path: &str,
    raw: Option<String>,
    parse: F,
) -> Option<Option<T>>
where
    E: Display,
    F: FnOnce(String) -> Result<T, E>,
{
    match raw.map(parse) {
        None => Some(None),
        Some(Ok(value)) => Some(Some(value)),
        Some(Err(e)) => {
            errors.add(path, e.to_string());
            None
        }
    }
}

/// Run a uniqueness check and record a violation under its path
pub(crate) async fn check_unique<G, C>(
    validator: &UniqueEntityValidator<G>,
    candidate: &C,
    constraint: &UniqueConstraint,
    errors: &mut FieldErrors,
) -> UserResult<()>
where
    G: ObjectGateway,
    G::Error: Into<UserError>,
    C: Candidate + Sync,
{
    if let Some(violation) = validator
        .validate(candidate, constraint)
        .await?
        .into_violation()
    {
        errors.add(violation.path, violation.message);
    }
    Ok(())
}

/// Fail with every recorded field error
pub(crate) fn finish(errors: FieldErrors) -> UserResult<()> {
    errors.into_result().map_err(UserError::Validation)
}
