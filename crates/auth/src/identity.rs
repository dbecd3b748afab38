//! Authentication and token resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{CredentialHasher, DirectoryError, TokenError, TokenService, User, UserDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Missing or invalid token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("failed to issue session token: {0}")]
    Issue(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Signing(msg) => AuthError::Issue(msg),
        }
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// Identity & session service: credentials in, bearer tokens out, and bearer
/// tokens back to live accounts.
pub struct Identity {
    directory: Arc<dyn UserDirectory>,
    credentials: Arc<dyn CredentialHasher>,
    tokens: TokenService,
    /// Verified against when the username is unknown so both failure paths do
    /// the same hashing work.
    decoy_hash: String,
}

impl Identity {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialHasher>,
        tokens: TokenService,
    ) -> Self {
        let decoy_hash = credentials.hash("registrar-decoy-credential");
        Self {
            directory,
            credentials,
            tokens,
            decoy_hash,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Exchange a username/password pair for a session token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable; the active
    /// flag is only consulted once the password matched.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let Some(user) = self.directory.find_by_username(username).await? else {
            let _ = self.credentials.verify(password, &self.decoy_hash);
            tracing::debug!(username, "login rejected: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.active {
            tracing::debug!(user_id = %user.id, "login rejected: account deactivated");
            return Err(AuthError::AccountDisabled);
        }

        let access_token = self.tokens.issue(user.id, now)?;
        tracing::info!(user_id = %user.id, role = %user.role, "session issued");

        Ok(Session { access_token, user })
    }

    /// Resolve a bearer token to the live, active account it names.
    pub async fn resolve(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<User, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token, now)?;

        let user = self
            .directory
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    /// Issue a fresh token for the account behind a still-valid one.
    pub async fn refresh(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<String, AuthError> {
        let user = self.resolve(token, now).await?;
        Ok(self.tokens.issue(user.id, now)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use registrar_core::UserId;

    use super::*;
    use crate::{NewUser, Role, Sha256CredentialHasher, UserProfile, DEFAULT_TOKEN_TTL};

    #[derive(Default)]
    struct MapDirectory {
        users: RwLock<HashMap<UserId, User>>,
    }

    #[async_trait]
    impl UserDirectory for MapDirectory {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
            let users = self.users.read().unwrap();
            Ok(users.values().find(|u| u.username == username).cloned())
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
            Ok(self.users.read().unwrap().get(&id).cloned())
        }
    }

    struct Fixture {
        identity: Identity,
        directory: Arc<MapDirectory>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(MapDirectory::default());
        let identity = Identity::new(
            directory.clone(),
            Arc::new(Sha256CredentialHasher),
            TokenService::new(b"test-secret", DEFAULT_TOKEN_TTL),
        );
        Fixture {
            identity,
            directory,
        }
    }

    fn add_user(fx: &Fixture, username: &str, password: &str, active: bool) -> UserId {
        let id = UserId::new();
        let user = User::provision(
            id,
            NewUser {
                username: username.to_string(),
                password_hash: Sha256CredentialHasher.hash(password),
                role: Role::Student,
                active,
                profile: UserProfile::default(),
            },
            Utc::now(),
        );
        fx.directory.users.write().unwrap().insert(id, user);
        id
    }

    fn set_active(fx: &Fixture, id: UserId, active: bool) {
        if let Some(u) = fx.directory.users.write().unwrap().get_mut(&id) {
            u.active = active;
        }
    }

    #[tokio::test]
    async fn login_issues_token_that_resolves() {
        let fx = fixture();
        let id = add_user(&fx, "teststudent", "pass123", true);
        let now = Utc::now();

        let session = fx.identity.authenticate("  teststudent ", "pass123", now).await.unwrap();
        assert_eq!(session.user.id, id);

        let user = fx.identity.resolve(Some(&session.access_token), now).await.unwrap();
        assert_eq!(user.username, "teststudent");
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let fx = fixture();
        add_user(&fx, "teststudent", "pass123", true);
        let now = Utc::now();

        let wrong = fx.identity.authenticate("teststudent", "nope", now).await.unwrap_err();
        let unknown = fx.identity.authenticate("nobody", "pass123", now).await.unwrap_err();
        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn missing_fields_rejected_before_lookup() {
        let fx = fixture();
        let now = Utc::now();
        assert_eq!(
            fx.identity.authenticate("teststudent", "", now).await.unwrap_err(),
            AuthError::MissingCredentials
        );
        assert_eq!(
            fx.identity.authenticate("   ", "pw", now).await.unwrap_err(),
            AuthError::MissingCredentials
        );
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in_even_with_correct_password() {
        let fx = fixture();
        add_user(&fx, "dormant", "pass123", false);
        let err = fx.identity.authenticate("dormant", "pass123", Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::AccountDisabled);
    }

    #[tokio::test]
    async fn resolve_distinguishes_token_failures() {
        let fx = fixture();
        let id = add_user(&fx, "teststudent", "pass123", true);
        let now = Utc::now();
        let token = fx.identity.tokens().issue(id, now).unwrap();

        assert_eq!(fx.identity.resolve(None, now).await.unwrap_err(), AuthError::MissingToken);
        assert_eq!(
            fx.identity.resolve(Some("not.a.jwt"), now).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            fx.identity
                .resolve(Some(&token), now + chrono::Duration::seconds(1801))
                .await
                .unwrap_err(),
            AuthError::ExpiredToken
        );
    }

    #[tokio::test]
    async fn resolve_rechecks_account_state() {
        let fx = fixture();
        let id = add_user(&fx, "teststudent", "pass123", true);
        let now = Utc::now();
        let token = fx.identity.tokens().issue(id, now).unwrap();

        set_active(&fx, id, false);
        assert_eq!(
            fx.identity.resolve(Some(&token), now).await.unwrap_err(),
            AuthError::AccountDisabled
        );
        assert_eq!(
            fx.identity.refresh(Some(&token), now).await.unwrap_err(),
            AuthError::AccountDisabled
        );

        let ghost = fx.identity.tokens().issue(UserId::new(), now).unwrap();
        assert_eq!(
            fx.identity.resolve(Some(&ghost), now).await.unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn refresh_issues_new_token_for_same_account() {
        let fx = fixture();
        let id = add_user(&fx, "teststudent", "pass123", true);
        let now = Utc::now();
        let token = fx.identity.tokens().issue(id, now).unwrap();

        let later = now + chrono::Duration::seconds(600);
        let refreshed = fx.identity.refresh(Some(&token), later).await.unwrap();
        let claims = fx.identity.tokens().verify(&refreshed, later).unwrap();
        assert_eq!(claims.sub, id);
    }
}
