use registrar_auth::User;

/// The authenticated, active account behind the current request.
///
/// Inserted by [`crate::middleware::auth_middleware`]; every protected
/// handler can rely on it being present.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}
