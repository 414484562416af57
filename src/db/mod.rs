pub mod pool;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use store::DocumentStore;

pub use pool::init_store_handle;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store is not configured: {0}")]
    NotConfigured(Arc<str>),

    #[error("sorted query unavailable: {0}")]
    MissingIndex(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Process-wide store handle, built once at startup and injected through
/// `AppState`.
#[derive(Clone)]
pub enum StoreHandle {
    Ready(Arc<dyn DocumentStore>),
    NotConfigured { reason: Arc<str> },
}

impl StoreHandle {
    pub fn not_configured(reason: impl Into<Arc<str>>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }

    pub fn get(&self) -> Result<&dyn DocumentStore, StoreError> {
        match self {
            Self::Ready(store) => Ok(store.as_ref()),
            Self::NotConfigured { reason } => Err(StoreError::NotConfigured(reason.clone())),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
