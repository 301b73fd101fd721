use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Executor, SqlitePool};

use super::{SessionStore, StoreConfig};
use crate::{SessionError, SessionId};

const MIGRATIONS: &[(&str, &str)] = &[(
    "20250301000001_create_sessions_table",
    include_str!("../../migrations_sqlite/20250301000001_create_sessions_table.sql"),
)];

/// `SQLite` session storage.
///
/// Records live in the `sessions` table; run [`SqliteStore::migrate`] once
/// before first use. Expiry is kept as unix milliseconds.
///
/// ```rust,ignore
/// let pool = SqlitePool::connect("sqlite::memory:").await?;
/// let store = SqliteStore::new(pool);
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_config(pool, StoreConfig::default())
    }

    pub fn with_config(pool: SqlitePool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the `sessions` table.
    ///
    /// Applied migrations are tracked in `_enclave_session_migrations`, so this
    /// is safe to call on every start.
    ///
    /// # Limitations
    ///
    /// Statements are split on `;`, so migrations must not contain semicolons
    /// inside string literals.
    pub async fn migrate(&self) -> Result<(), SessionError> {
        self.pool
            .execute(
                r"
                CREATE TABLE IF NOT EXISTS _enclave_session_migrations (
                    name TEXT PRIMARY KEY,
                    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                )
                ",
            )
            .await
            .map_err(|e| db_error("migrate", &e))?;

        for (name, sql) in MIGRATIONS {
            let applied: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM _enclave_session_migrations WHERE name = ?)",
            )
            .bind(*name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("migrate", &e))?;

            if applied {
                continue;
            }

            for statement in sql.split(';') {
                let trimmed = statement.trim();
                if !trimmed.is_empty() {
                    self.pool
                        .execute(trimmed)
                        .await
                        .map_err(|e| db_error("migrate", &e))?;
                }
            }

            sqlx::query("INSERT INTO _enclave_session_migrations (name) VALUES (?)")
                .bind(*name)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("migrate", &e))?;
        }

        Ok(())
    }
}

fn db_error(operation: &str, e: &sqlx::Error) -> SessionError {
    log::error!(target: "enclave_session", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
    SessionError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl SessionStore for SqliteStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "sqlite_store.load", skip_all, err))]
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        let now = Utc::now().timestamp_millis();

        let payload: Option<Vec<u8>> = sqlx::query_scalar(
            r"SELECT payload FROM sessions
               WHERE session_key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(self.config.record_key(id))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load", &e))?;

        payload.ok_or(SessionError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "sqlite_store.save", skip_all, err))]
    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        let now = Utc::now();
        let expires_at = self
            .config
            .expires_at(now)
            .map(|at| at.timestamp_millis());

        sqlx::query(
            r"INSERT INTO sessions (session_key, payload, expires_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (session_key) DO UPDATE SET
                   payload = excluded.payload,
                   expires_at = excluded.expires_at,
                   updated_at = excluded.updated_at",
        )
        .bind(self.config.record_key(id))
        .bind(payload)
        .bind(expires_at)
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "sqlite_store.delete", skip_all, err))]
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE session_key = ?")
            .bind(self.config.record_key(id))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete", &e))?;

        Ok(())
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("prune_expired", &e))?;

        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.pool.close().await;
        Ok(())
    }
}
