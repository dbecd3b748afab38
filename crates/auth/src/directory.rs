use async_trait::async_trait;
use thiserror::Error;

use registrar_core::UserId;

use crate::User;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// Read-only account lookup used by [`crate::Identity`].
///
/// Implemented by the persistence layer; this crate never talks to storage
/// directly.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Exact (case-sensitive) username match.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError>;
}
