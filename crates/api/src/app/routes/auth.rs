use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use registrar_auth::AuthError;
use registrar_infra::RegistrarStore;

use crate::app::dto::{JsonBody, LoginRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CurrentUser;
use crate::middleware::extract_bearer;

pub async fn login<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Response {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let session = match services
        .identity
        .authenticate(&username, &password, Utc::now())
        .await
    {
        Ok(s) => s,
        Err(e) => return errors::auth_error_to_response(e),
    };

    Json(json!({
        "access_token": session.access_token,
        "user": session.user,
    }))
    .into_response()
}

pub async fn current_user(Extension(current): Extension<CurrentUser>) -> Response {
    Json(current.0).into_response()
}

/// Any token that still verifies may be exchanged, as long as its account is
/// still present and active.
pub async fn refresh<S: RegistrarStore>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    headers: HeaderMap,
) -> Response {
    match services
        .identity
        .refresh(extract_bearer(&headers), Utc::now())
        .await
    {
        Ok(token) => Json(json!({ "access_token": token })).into_response(),
        Err(AuthError::UserNotFound | AuthError::AccountDisabled) => {
            errors::json_error(StatusCode::UNAUTHORIZED, "User not found or inactive")
        }
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Sessions are stateless; the client discards its token.
pub async fn logout() -> Response {
    Json(json!({ "message": "Logged out successfully" })).into_response()
}
