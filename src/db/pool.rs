use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::postgres::PgStore;
use super::{StoreError, StoreHandle};
use crate::config::Config;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Connects to the document store and applies migrations. A missing
/// `DATABASE_URL` is reported as `NotConfigured`, not as a connection error.
pub async fn init_store(config: &Config) -> Result<PgStore, StoreError> {
    let Some(url) = config.database_url.as_deref() else {
        return Err(StoreError::NotConfigured("DATABASE_URL is not set".into()));
    };

    let pool = create_pool(url, config.database_max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Document store migrations applied");

    Ok(PgStore::new(pool))
}

/// Startup wrapper: any initialization failure degrades to a handle that
/// rejects persistence requests.
pub async fn init_store_handle(config: &Config) -> StoreHandle {
    match init_store(config).await {
        Ok(store) => {
            tracing::info!("Document store configured");
            StoreHandle::Ready(Arc::new(store))
        }
        Err(StoreError::NotConfigured(reason)) => {
            tracing::warn!(%reason, "Document store not configured, persistence endpoints disabled");
            StoreHandle::NotConfigured { reason }
        }
        Err(e) => {
            tracing::error!(error = %e, "Document store unavailable, persistence endpoints disabled");
            StoreHandle::not_configured(e.to_string())
        }
    }
}
