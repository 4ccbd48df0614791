//! Bearer Token Middleware
//!
//! Guards the `/user` routes: a request passes only with a valid access
//! token, and handlers read the caller from [`AuthenticatedUser`].

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::id::UserId;
use platform::bearer::extract_bearer;
use platform::jwt::JwtManager;

use crate::error::UserError;

/// Id of the user the access token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Middleware that requires a valid bearer token
pub async fn require_bearer(
    State(jwt): State<Arc<JwtManager>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, UserError> {
    let token = extract_bearer(req.headers()).ok_or(UserError::MissingToken)?;
    let claims = jwt.validate(token)?;
    let user_id = UserId::new(claims.user_id()?);

    req.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = UserError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(UserError::MissingToken)
    }
}
