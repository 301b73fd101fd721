//! Session record storage.
//!
//! | Store | Feature | Notes |
//! |-------|---------|-------|
//! | [`MemoryStore`] | always | process-local, for development and tests |
//! | [`FileStore`] | always | one JSON file per record |
//! | [`SqliteStore`] | `sqlx_sqlite` | shares a `SqlitePool` |
//! | [`PostgresStore`] | `sqlx_postgres` | shares a `PgPool` |
//! | [`RedisStore`] | `redis` | native key expiry |
//!
//! Stores only ever see encoded payload bytes; encoding is the manager's
//! concern.

mod file_store;
mod memory_store;
#[cfg(any(test, feature = "mocks"))]
mod mock;
#[cfg(feature = "sqlx_postgres")]
mod postgres_store;
#[cfg(feature = "redis")]
mod redis_store;
#[cfg(feature = "sqlx_sqlite")]
mod sqlite_store;

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
#[cfg(any(test, feature = "mocks"))]
pub use mock::MockSessionStore;
#[cfg(feature = "sqlx_postgres")]
pub use postgres_store::PostgresStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
#[cfg(feature = "sqlx_sqlite")]
pub use sqlite_store::SqliteStore;

use crate::{SessionError, SessionId};

/// Storage backend for session records.
///
/// Implement this trait for custom storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the payload stored for `id`.
    ///
    /// A missing or expired record must fail with [`SessionError::NotFound`]
    /// and nothing else; the manager rotates identifiers on that error only.
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError>;

    /// Creates or replaces the record for `id` and restarts its expiry window.
    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError>;

    /// Removes the record for `id`. Removing a missing record is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Removes expired records, returning how many were removed.
    ///
    /// Stores with native expiry keep the default.
    async fn prune_expired(&self) -> Result<u64, SessionError> {
        Ok(0)
    }

    /// Releases pooled resources. The store must not be used afterwards.
    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        (**self).load(id).await
    }

    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        (**self).save(id, payload).await
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        (**self).delete(id).await
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        (**self).prune_expired().await
    }

    async fn close(&self) -> Result<(), SessionError> {
        (**self).close().await
    }
}

/// Maps a session identifier to a storage key. Must be injective.
#[derive(Clone)]
pub enum KeyFormat {
    /// `prefix` followed by the identifier.
    Prefixed(String),
    Custom(fn(&str) -> String),
}

impl Default for KeyFormat {
    fn default() -> Self {
        KeyFormat::Prefixed("session:".to_owned())
    }
}

impl fmt::Debug for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Prefixed(prefix) => f.debug_tuple("Prefixed").field(prefix).finish(),
            KeyFormat::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl KeyFormat {
    pub fn key(&self, id: &SessionId) -> String {
        match self {
            KeyFormat::Prefixed(prefix) => format!("{prefix}{id}"),
            KeyFormat::Custom(format) => format(id.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Default: `session:` prefix
    pub key_format: KeyFormat,

    /// Absolute lifetime of a record, restarted by every save.
    /// `None` keeps records until deleted.
    ///
    /// Default: 24 hours
    pub ttl: Option<Duration>,

    /// Upper bound for a single store call made by the manager.
    ///
    /// Default: 5 seconds
    pub operation_timeout: StdDuration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_format: KeyFormat::default(),
            ttl: Some(Duration::hours(24)),
            operation_timeout: StdDuration::from_secs(5),
        }
    }
}

impl StoreConfig {
    pub fn record_key(&self, id: &SessionId) -> String {
        self.key_format.key(id)
    }

    /// Expiry for a record saved at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.and_then(|ttl| now.checked_add_signed(ttl))
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.ttl.is_some_and(|ttl| ttl <= Duration::zero()) {
            return Err(SessionError::Configuration(
                "store ttl must be positive".to_owned(),
            ));
        }
        if self.operation_timeout.is_zero() {
            return Err(SessionError::Configuration(
                "store operation_timeout must be positive".to_owned(),
            ));
        }
        if let KeyFormat::Prefixed(prefix) = &self.key_format {
            if prefix.is_empty() {
                log::warn!(target: "enclave_session", "msg=\"empty store key prefix, records share the key space with other data\"");
            }
        }
        Ok(())
    }
}

pub(crate) fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|at| at <= now)
}
