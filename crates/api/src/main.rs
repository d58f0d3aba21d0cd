use std::sync::Arc;

use anyhow::Context;

use warden_api::config::ApiConfig;
use warden_infra::{
    InMemoryCredentialStore, PostgresCredentialStore, Services, SharedStore, seed_admin,
};

const POSTGRES_MAX_CONNECTIONS: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PostgresCredentialStore::connect(url, POSTGRES_MAX_CONNECTIONS)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            tracing::info!("using Postgres credential store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let services = Services::new(store, config.service_config());

    if config.seed_admin && seed_admin(&services).await.context("failed to seed administrator")? {
        tracing::warn!("seeded default administrator account; change its password");
    }

    let app = warden_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
