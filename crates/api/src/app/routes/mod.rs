use axum::{
    routing::{get, post},
    Router,
};

use registrar_infra::RegistrarStore;

pub mod auth;
pub mod calendar;
pub mod document_requests;
pub mod major_applications;
pub mod notifications;
pub mod payments;
pub mod petitions;
pub mod system;
pub mod users;

/// Endpoints reachable without a resolved session. `refresh` reads the bearer
/// token itself so it can answer 401 for every failure.
pub fn public_router<S: RegistrarStore + Clone>() -> Router {
    Router::new()
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh::<S>))
}

/// Router for all authenticated endpoints.
pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new()
        .route("/auth/user", get(auth::current_user))
        .nest("/document-requests", document_requests::router::<S>())
        .nest("/petitions", petitions::router::<S>())
        .nest("/major-applications", major_applications::router::<S>())
        .nest("/calendar", calendar::router::<S>())
        .nest("/payments", payments::router::<S>())
        .nest("/notifications", notifications::router::<S>())
        .nest("/users", users::router::<S>())
}
