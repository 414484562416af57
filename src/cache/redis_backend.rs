use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo, RedisError, RedisResult};
use tokio::sync::Mutex;

use super::{CacheBackend, CacheError};

impl From<RedisError> for CacheError {
    fn from(e: RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

/// The shared connection is dead and must be reopened.
fn is_connection_lost(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped()
}

pub struct RedisCache {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCache {
    /// Parses the endpoint without connecting. `token`, when given, replaces
    /// any password embedded in the URL.
    pub fn connect(url: &str, token: Option<&str>) -> Result<Self, CacheError> {
        let mut info = url
            .into_connection_info()
            .map_err(|e| CacheError::Config(e.to_string()))?;
        if let Some(token) = token {
            info.redis.password = Some(token.to_string());
        }
        let client = redis::Client::open(info).map_err(|e| CacheError::Config(e.to_string()))?;

        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        *self.conn.lock().await = None;
    }

    /// Runs `op` on the shared connection. A lost connection is dropped and
    /// the command retried once on a fresh one.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, CacheError>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        match op(self.connection().await?).await {
            Err(e) if is_connection_lost(&e) => {
                tracing::debug!(error = %e, "Redis connection lost, reconnecting");
                self.reset().await;
                let result = op(self.connection().await?).await;
                if matches!(&result, Err(e) if is_connection_lost(e)) {
                    self.reset().await;
                }
                Ok(result?)
            }
            other => Ok(other?),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let secs = ttl.as_secs().max(1);
        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, secs).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.run(|mut conn| async move { conn.del::<_, ()>(key).await })
            .await
    }
}
