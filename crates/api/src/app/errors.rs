use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use registrar_auth::{AuthError, AuthzError};
use registrar_core::DomainError;
use registrar_infra::EngineError;

const INTERNAL: &str = "internal server error";

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "message": message.into() }))).into_response()
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::Validation(_) | DomainError::Conflict(_) | DomainError::InvalidId(_) => {
            StatusCode::BAD_REQUEST
        }
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    json_error(status, err.to_string())
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, err.to_string())
}

pub fn engine_error_to_response(err: EngineError) -> Response {
    match err {
        EngineError::Access(e) => authz_error_to_response(e),
        EngineError::Domain(e) => domain_error_to_response(e),
        EngineError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    let status = match &err {
        AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::MissingToken
        | AuthError::InvalidToken
        | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
        AuthError::AccountDisabled => StatusCode::FORBIDDEN,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::Issue(_) | AuthError::Directory(_) => {
            tracing::error!(error = %err, "identity service failure");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL);
        }
    };
    json_error(status, err.to_string())
}
