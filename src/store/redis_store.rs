use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{SessionStore, StoreConfig};
use crate::{SessionError, SessionId};

/// Redis session storage.
///
/// Expiry is left to Redis: records are written with `PSETEX`, so
/// `prune_expired` has nothing to do.
///
/// ```rust,ignore
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(ConnectionManager::new(client).await?);
/// ```
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: StoreConfig,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self::with_config(connection, StoreConfig::default())
    }

    pub fn with_config(connection: ConnectionManager, config: StoreConfig) -> Self {
        Self { connection, config }
    }
}

/// `PSETEX` lifetime for a configured TTL. Redis rejects a zero expiry, so
/// anything shorter than a millisecond is written as one.
fn ttl_millis(ttl: Option<chrono::Duration>) -> Option<u64> {
    ttl.map(|ttl| u64::try_from(ttl.num_milliseconds()).unwrap_or(0).max(1))
}

fn redis_error(operation: &str, e: &redis::RedisError) -> SessionError {
    log::error!(target: "enclave_session", "msg=\"redis error\", operation=\"{operation}\", error=\"{e}\"");
    SessionError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl SessionStore for RedisStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "redis_store.load", skip_all, err))]
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        let mut connection = self.connection.clone();

        let payload: Option<Vec<u8>> = connection
            .get(self.config.record_key(id))
            .await
            .map_err(|e| redis_error("load", &e))?;

        payload.ok_or(SessionError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "redis_store.save", skip_all, err))]
    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();
        let key = self.config.record_key(id);

        let result: Result<(), redis::RedisError> = match ttl_millis(self.config.ttl) {
            Some(millis) => connection.pset_ex(key, payload, millis).await,
            None => connection.set(key, payload).await,
        };

        result.map_err(|e| redis_error("save", &e))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "redis_store.delete", skip_all, err))]
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut connection = self.connection.clone();

        let _: i64 = connection
            .del(self.config.record_key(id))
            .await
            .map_err(|e| redis_error("delete", &e))?;

        Ok(())
    }
}
