use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    handler::Handler,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;

use registrar_auth::policy;
use registrar_core::MajorApplicationId;
use registrar_infra::RegistrarStore;

use crate::app::dto::{self, JsonBody};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require_roles;
use crate::context::CurrentUser;

pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new()
        .route(
            "/",
            get(list_major_applications::<S>).post(
                create_major_application::<S>
                    .layer(from_fn_with_state(policy::CREATE_MAJOR_APPLICATION, require_roles)),
            ),
        )
        .route(
            "/:id/status",
            patch(
                update_status::<S>.layer(from_fn_with_state(policy::UPDATE_STATUS, require_roles)),
            ),
        )
}

pub async fn list_major_applications<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    match services.engine.list_major_applications(current.user()).await {
        Ok(applications) => Json(applications).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn create_major_application<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(body): JsonBody<dto::CreateMajorApplicationRequest>,
) -> Response {
    match services
        .engine
        .create_major_application(current.user(), body.into(), Utc::now())
        .await
    {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn update_status<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::StatusUpdateRequest>,
) -> Response {
    let id: MajorApplicationId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::NOT_FOUND, "Application not found"),
    };

    match services
        .engine
        .update_major_application_status(current.user(), id, body.into(), Utc::now())
        .await
    {
        Ok(application) => Json(application).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
