//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::id::CertificateId;
use kernel::validation::{ObjectGateway, UniqueEntityValidator};
use platform::jwt::JwtManager;

use crate::application::config::UsersConfig;
use crate::application::{
    CertificatesUseCase, CurrentUserUseCase, PurchaseInput, RegisterInput, RegisterUseCase,
    SignInInput, SignInUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::domain::repository::{CertificateRepository, UserRepository};
use crate::error::{UserError, UserResult};
use crate::presentation::dto::{
    CertificateResponse, CreatedResponse, DataResponse, LoginRequest, PurchaseRequest,
    RegisterRequest, TokenResponse, UpdateProfileRequest, UserResponse,
};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for users handlers
#[derive(Clone)]
pub struct UsersAppState<R>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<UsersConfig>,
}

impl<R> UsersAppState<R>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: UsersConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            jwt: Arc::new(JwtManager::new(config.jwt.clone())),
            config: Arc::new(config),
        }
    }

    fn validator(&self) -> UniqueEntityValidator<R> {
        UniqueEntityValidator::new(self.repo.clone())
    }
}

// ============================================================================
// Register / Login
// ============================================================================

/// POST /register
pub async fn register<R>(
    State(state): State<UsersAppState<R>>,
    Json(req): Json<RegisterRequest>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.validator(), state.config.clone());

    let input = RegisterInput {
        name: req.name,
        surname: req.surname,
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(CreatedResponse {
            id: output.user_id.get(),
        })),
    ))
}

/// POST /user/login
pub async fn login<R>(
    State(state): State<UsersAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> UserResult<Json<TokenResponse>>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.jwt.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok(Json(TokenResponse {
        token: output.token,
    }))
}

// ============================================================================
// Current User
// ============================================================================

/// GET /user
pub async fn current_user<R>(
    State(state): State<UsersAppState<R>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> UserResult<Json<DataResponse<UserResponse>>>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
{
    let user = CurrentUserUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(user_id)
        .await?;

    Ok(Json(DataResponse::new(user.into())))
}

/// PATCH /user
pub async fn update_profile<R>(
    State(state): State<UsersAppState<R>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> UserResult<Json<DataResponse<UserResponse>>>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    let input = UpdateProfileInput {
        name: req.name,
        surname: req.surname,
        email: req.email,
    };
    UpdateProfileUseCase::new(state.repo.clone(), state.validator())
        .execute(user_id, input)
        .await?;

    let user = CurrentUserUseCase::new(state.repo.clone(), state.repo.clone())
        .execute(user_id)
        .await?;

    Ok(Json(DataResponse::new(user.into())))
}

// ============================================================================
// Certificates
// ============================================================================

/// POST /user/certificates
pub async fn purchase_certificate<R>(
    State(state): State<UsersAppState<R>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(req): Json<PurchaseRequest>,
) -> UserResult<impl IntoResponse>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    let input = PurchaseInput {
        name: req.name,
        price: req.price,
    };
    let certificate = CertificatesUseCase::new(state.repo.clone(), state.validator())
        .purchase(user_id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(CertificateResponse::from(certificate))),
    ))
}

/// GET /user/certificates
pub async fn list_certificates<R>(
    State(state): State<UsersAppState<R>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> UserResult<Json<DataResponse<Vec<CertificateResponse>>>>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    let certificates = CertificatesUseCase::new(state.repo.clone(), state.validator())
        .list(user_id)
        .await?;

    Ok(Json(DataResponse::new(
        certificates
            .into_iter()
            .map(CertificateResponse::from)
            .collect(),
    )))
}

/// DELETE /user/certificates/{id}
pub async fn remove_certificate<R>(
    State(state): State<UsersAppState<R>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(certificate_id): Path<i64>,
) -> UserResult<StatusCode>
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    CertificatesUseCase::new(state.repo.clone(), state.validator())
        .remove(user_id, CertificateId::new(certificate_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
