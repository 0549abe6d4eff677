//! Redis-backed store

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;

use crate::connection::RedisConnection;
use crate::error::{CacheError, CacheResult};
use crate::store::{CompareAndDelete, KeyValueStore};

// Returns 1 when deleted, 0 on mismatch, -1 when the key is absent.
const COMPARE_AND_DELETE_LUA: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
  return -1
elseif current == ARGV[1] then
  redis.call('DEL', KEYS[1])
  return 1
else
  return 0
end
";

/// [`KeyValueStore`] on top of a shared [`RedisConnection`]
#[derive(Clone)]
pub struct RedisStore {
    connection: Arc<RedisConnection>,
    compare_and_delete: Script,
}

impl RedisStore {
    pub fn new(connection: Arc<RedisConnection>) -> Self {
        Self {
            connection,
            compare_and_delete: Script::new(COMPARE_AND_DELETE_LUA),
        }
    }

    pub fn connection(&self) -> &Arc<RedisConnection> {
        &self.connection
    }

    /// Run one operation under the command timeout, tracking connection health
    async fn run<T, F, Fut>(&self, op: F) -> CacheResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut + Send,
        Fut: Future<Output = redis::RedisResult<T>> + Send,
        T: Send,
    {
        let timeout = self.connection.config().command_timeout;

        let attempt = async {
            let conn = self.connection.connection().await?;
            op(conn).await.map_err(CacheError::from)
        };

        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(timeout)),
        };

        match &result {
            Ok(_) => self.connection.mark_ready(),
            Err(e) => self.connection.mark_failed(e),
        }
        result
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        self.run(|mut conn| async move {
            let _: () = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(seconds)
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.run(|mut conn| async move {
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.run(|mut conn| async move {
            let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
            Ok(removed > 0)
        })
        .await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> CacheResult<CompareAndDelete> {
        let script = &self.compare_and_delete;
        let outcome = self
            .run(|mut conn| async move {
                let outcome: i64 = script
                    .key(key)
                    .arg(expected)
                    .invoke_async(&mut conn)
                    .await?;
                Ok(outcome)
            })
            .await?;

        Ok(match outcome {
            1 => CompareAndDelete::Deleted,
            0 => CompareAndDelete::Mismatch,
            _ => CompareAndDelete::Absent,
        })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionState, RedisConfig};

    fn unreachable_store() -> RedisStore {
        let config = RedisConfig::from_url("redis://127.0.0.1:1")
            .unwrap()
            .with_connect_timeout(Duration::from_millis(200))
            .with_command_timeout(Duration::from_secs(1))
            .with_max_reconnect_attempts(Some(0));
        RedisStore::new(Arc::new(RedisConnection::new(config).unwrap()))
    }

    #[tokio::test]
    async fn test_unreachable_server_surfaces_unavailable() {
        let store = unreachable_store();

        let err = store
            .set_with_ttl("otp:a@example.com", "123456", Duration::from_secs(600))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(store.connection().state(), ConnectionState::Error);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_commands() {
        let store = unreachable_store();
        store.connection().shutdown().await;

        let err = store.get("otp:a@example.com").await.unwrap_err();
        assert!(matches!(err, CacheError::ShuttingDown));
    }
}
