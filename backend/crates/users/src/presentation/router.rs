//! Users Router

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use kernel::validation::ObjectGateway;

use crate::application::config::UsersConfig;
use crate::domain::repository::{CertificateRepository, UserRepository};
use crate::error::UserError;
use crate::infra::postgres::PgUsersRepository;
use crate::presentation::handlers::{self, UsersAppState};
use crate::presentation::middleware::require_bearer;

/// Create the users router with PostgreSQL repository
pub fn users_router(repo: PgUsersRepository, config: UsersConfig) -> Router {
    users_router_generic(repo, config)
}

/// Create a generic users router for any store implementation
///
/// `/register` and `/user/login` are public; every other route needs a
/// bearer token.
pub fn users_router_generic<R>(repo: R, config: UsersConfig) -> Router
where
    R: UserRepository + CertificateRepository + ObjectGateway + Clone + Send + Sync + 'static,
    <R as ObjectGateway>::Error: Into<UserError>,
{
    let state = UsersAppState::new(repo, config);

    let protected = Router::new()
        .route(
            "/user",
            get(handlers::current_user::<R>).patch(handlers::update_profile::<R>),
        )
        .route(
            "/user/certificates",
            get(handlers::list_certificates::<R>).post(handlers::purchase_certificate::<R>),
        )
        .route(
            "/user/certificates/{id}",
            delete(handlers::remove_certificate::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/user/login", post(handlers::login::<R>))
        .merge(protected)
        .with_state(state)
}
