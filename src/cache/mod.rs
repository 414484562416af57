//! Best-effort read-through cache for the journal list.
//!
//! Every operation is time-boxed and every failure degrades to a miss or a
//! no-op; callers never see a cache error.

pub mod redis_backend;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::config::Config;
use crate::models::journal::JournalEntry;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("invalid cache configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub fn journals_key(user_id: &str) -> String {
    format!("journals:{user_id}")
}

#[derive(Clone)]
pub struct JournalCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    op_timeout: Duration,
}

impl JournalCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
            op_timeout,
        }
    }

    /// A cache that always misses.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
            op_timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Builds the cache from config. Missing or invalid settings leave the
    /// service running without a cache.
    pub fn from_config(config: &Config) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            tracing::warn!("REDIS_URL not set, running without cache");
            return Self::disabled();
        };

        match redis_backend::RedisCache::connect(url, config.redis_token.as_deref()) {
            Ok(backend) => {
                tracing::info!("Journal cache configured");
                Self::new(Arc::new(backend), config.cache_ttl(), config.cache_timeout())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache unavailable, continuing without cache");
                Self::disabled()
            }
        }
    }

    async fn bounded<T, Fut>(&self, op: &'static str, key: &str, fut: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(op, key, error = %e, "Cache operation failed");
                None
            }
            Err(_) => {
                tracing::warn!(op, key, timeout_ms = self.op_timeout.as_millis() as u64, "Cache operation timed out");
                None
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        self.bounded("get", key, backend.get(key)).await.flatten()
    }

    pub async fn set(&self, key: &str, value: &str) {
        if let Some(backend) = &self.backend {
            self.bounded("set", key, backend.set_ex(key, value, self.ttl)).await;
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Some(backend) = &self.backend {
            self.bounded("delete", key, backend.delete(key)).await;
        }
    }

    pub async fn get_journals(&self, user_id: &str) -> Option<Vec<JournalEntry>> {
        let key = journals_key(user_id);
        let raw = self.get(&key).await?;
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache value");
                None
            }
        }
    }

    pub async fn put_journals(&self, user_id: &str, entries: &[JournalEntry]) {
        if !self.is_enabled() {
            return;
        }
        match serde_json::to_string(entries) {
            Ok(raw) => self.set(&journals_key(user_id), &raw).await,
            Err(e) => tracing::warn!(user_id, error = %e, "Failed to encode journal list for cache"),
        }
    }

    pub async fn invalidate_journals(&self, user_id: &str) {
        self.delete(&journals_key(user_id)).await;
    }
}
