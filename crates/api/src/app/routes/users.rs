use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    handler::Handler,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::patch,
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use registrar_auth::policy;
use registrar_core::UserId;
use registrar_infra::RegistrarStore;

use crate::app::dto::{self, JsonBody};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require_roles;
use crate::context::CurrentUser;

pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new().route(
        "/:id/active",
        patch(set_active::<S>.layer(from_fn_with_state(policy::MANAGE_USERS, require_roles))),
    )
}

pub async fn set_active<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::SetActiveRequest>,
) -> Response {
    let id = match Uuid::parse_str(&id) {
        Ok(v) => UserId::from_uuid(v),
        Err(_) => return errors::json_error(StatusCode::NOT_FOUND, "User not found"),
    };
    let Some(active) = body.active else {
        return errors::json_error(StatusCode::BAD_REQUEST, "active is required");
    };

    match services
        .engine
        .set_user_active(current.user(), id, active, Utc::now())
        .await
    {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
