use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::net::TcpListener;

use registrar_api::app::{build_app, AppServices};
use registrar_auth::{CredentialHasher, Sha256CredentialHasher};
use registrar_infra::{seed_demo_data, AppConfig, InMemoryStore, PostgresStore, RegistrarStore};
use registrar_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging comes up before the config so its warnings are not lost.
    let production = std::env::var("APP_ENV").is_ok_and(|v| v.trim() == "production");
    registrar_observability::init(LogFormat::for_production(production));

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting registrar api");

    let hasher: Arc<dyn CredentialHasher> = Arc::new(Sha256CredentialHasher);

    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.migrate().await.context("failed to apply migrations")?;
            serve(store, hasher, &config).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set; data is kept in memory and lost on exit");
            serve(InMemoryStore::new(), hasher, &config).await
        }
    }
}

async fn serve<S>(store: S, hasher: Arc<dyn CredentialHasher>, config: &AppConfig) -> anyhow::Result<()>
where
    S: RegistrarStore + Clone,
{
    let services = Arc::new(AppServices::new(store, hasher, config));

    if config.seed_demo_data {
        seed_demo_data(&services.engine, services.hasher.as_ref(), Utc::now())
            .await
            .context("failed to seed demo data")?;
    }

    let app = build_app(services);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
