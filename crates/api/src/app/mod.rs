//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the engine and identity service shared by every handler
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and the JSON body extractor
//! - `errors.rs`: `{ "message": ... }` error responses

use std::sync::Arc;

use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Extension, Router};
use tower::ServiceBuilder;

use registrar_infra::RegistrarStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app<S>(services: Arc<AppServices<S>>) -> Router
where
    S: RegistrarStore + Clone,
{
    let auth_state = middleware::AuthState {
        identity: services.identity.clone(),
    };

    // Protected routes: a live, active account is attached before any handler runs.
    let protected = routes::router::<S>()
        .layer(Extension(services.clone()))
        .layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    let public = routes::public_router::<S>().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", public.merge(protected))
        .layer(ServiceBuilder::new().layer(from_fn(middleware::log_request)))
}
