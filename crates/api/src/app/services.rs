use std::sync::Arc;

use registrar_auth::{CredentialHasher, Identity, TokenService};
use registrar_infra::{AppConfig, LifecycleEngine, RegistrarStore, StoreDirectory};

/// Everything a handler needs, wired once at start-up.
pub struct AppServices<S> {
    pub engine: LifecycleEngine<S>,
    pub identity: Arc<Identity>,
    pub hasher: Arc<dyn CredentialHasher>,
}

impl<S> AppServices<S>
where
    S: RegistrarStore + Clone,
{
    pub fn new(store: S, hasher: Arc<dyn CredentialHasher>, config: &AppConfig) -> Self {
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let identity = Identity::new(
            Arc::new(StoreDirectory::new(store.clone())),
            hasher.clone(),
            tokens,
        );

        Self {
            engine: LifecycleEngine::new(store),
            identity: Arc::new(identity),
            hasher,
        }
    }
}
