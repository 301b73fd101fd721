use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool};

use super::{SessionStore, StoreConfig};
use crate::{SessionError, SessionId};

const MIGRATIONS: &[(&str, &str)] = &[(
    "20250301000001_create_sessions_table",
    include_str!("../../migrations_postgres/20250301000001_create_sessions_table.sql"),
)];

/// `PostgreSQL` session storage.
///
/// Records live in the `sessions` table; run [`PostgresStore::migrate`] once
/// before first use.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: StoreConfig,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, StoreConfig::default())
    }

    pub fn with_config(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `sessions` table, tracking applied migrations in
    /// `_enclave_session_migrations`.
    pub async fn migrate(&self) -> Result<(), SessionError> {
        self.pool
            .execute(
                r"
                CREATE TABLE IF NOT EXISTS _enclave_session_migrations (
                    name TEXT PRIMARY KEY,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                ",
            )
            .await
            .map_err(|e| db_error("migrate", &e))?;

        for (name, sql) in MIGRATIONS {
            let applied: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM _enclave_session_migrations WHERE name = $1)",
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

            sqlx::query("INSERT INTO _enclave_session_migrations (name) VALUES ($1)")
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
impl SessionStore for PostgresStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "postgres_store.load", skip_all, err))]
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        let payload: Option<Vec<u8>> = sqlx::query_scalar(
            r"SELECT payload FROM sessions
               WHERE session_key = $1 AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(self.config.record_key(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load", &e))?;

        payload.ok_or(SessionError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "postgres_store.save", skip_all, err))]
    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        let expires_at: Option<DateTime<Utc>> = self.config.expires_at(Utc::now());

        sqlx::query(
            r"INSERT INTO sessions (session_key, payload, expires_at, updated_at)
               VALUES ($1, $2, $3, NOW())
               ON CONFLICT (session_key) DO UPDATE SET
                   payload = EXCLUDED.payload,
                   expires_at = EXCLUDED.expires_at,
                   updated_at = NOW()",
        )
        .bind(self.config.record_key(id))
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "postgres_store.delete", skip_all, err))]
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE session_key = $1")
            .bind(self.config.record_key(id))
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete", &e))?;

        Ok(())
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
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
