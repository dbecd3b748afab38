//! [`UserDirectory`] backed by the registrar store.

use async_trait::async_trait;

use registrar_auth::{DirectoryError, User, UserDirectory};
use registrar_core::UserId;

use crate::store::{RegistrarStore, StoreError, StoreTx};

impl From<StoreError> for DirectoryError {
    fn from(value: StoreError) -> Self {
        DirectoryError(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StoreDirectory<S> {
    store: S,
}

impl<S> StoreDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: RegistrarStore> UserDirectory for StoreDirectory<S> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.user_by_username(username).await?)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.user_by_id(id).await?)
    }
}
