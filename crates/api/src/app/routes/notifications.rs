use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use registrar_infra::RegistrarStore;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new().route("/", get(list_notifications::<S>))
}

pub async fn list_notifications<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    match services.engine.list_notifications(current.user()).await {
        Ok(notifications) => Json(notifications).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
