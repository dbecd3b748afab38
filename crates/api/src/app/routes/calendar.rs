use std::sync::Arc;

use axum::{
    extract::Extension,
    handler::Handler,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use registrar_auth::policy;
use registrar_infra::RegistrarStore;

use crate::app::dto::{self, JsonBody};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require_roles;
use crate::context::CurrentUser;

pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new().route(
        "/",
        get(list_events::<S>).post(
            create_event::<S>.layer(from_fn_with_state(policy::CREATE_CALENDAR_EVENT, require_roles)),
        ),
    )
}

/// Shared calendar, earliest first.
pub async fn list_events<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    match services.engine.list_calendar_events(current.user()).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn create_event<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(body): JsonBody<dto::CreateCalendarEventRequest>,
) -> Response {
    match services
        .engine
        .create_calendar_event(current.user(), body.into(), Utc::now())
        .await
    {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
