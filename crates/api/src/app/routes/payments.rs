use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use registrar_infra::RegistrarStore;

use crate::app::dto::{self, JsonBody};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router<S: RegistrarStore + Clone>() -> Router {
    Router::new().route("/", post(pay::<S>))
}

/// Settle a document request. Responds 200: this acts on an existing request
/// rather than creating a resource of its own.
pub async fn pay<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(body): JsonBody<dto::CreatePaymentRequest>,
) -> Response {
    match services.engine.pay(current.user(), body.into(), Utc::now()).await {
        Ok(payment) => Json(payment).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
