//! Route-level role gate.
//!
//! Runs after [`crate::middleware::auth_middleware`] and before the handler
//! reads its body, so a caller with the wrong role gets 403 even when the
//! payload is malformed. The lifecycle engine repeats the same check.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};

use registrar_auth::{authorize, Role};

use crate::app::errors;
use crate::context::CurrentUser;

pub async fn require_roles(
    State(required): State<&'static [Role]>,
    Extension(current): Extension<CurrentUser>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(e) = authorize(current.user(), required) {
        tracing::debug!(
            user_id = %current.user().id,
            role = %current.user().role,
            path = %req.uri().path(),
            "role gate denied request"
        );
        return errors::authz_error_to_response(e);
    }
    next.run(req).await
}
