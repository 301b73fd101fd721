//! In-memory session storage.
//!
//! Suitable for development, testing, and single-instance deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{SessionStore, StoreConfig, is_expired};
use crate::{SessionError, SessionId};

#[derive(Debug, Clone)]
struct Record {
    payload: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory session storage.
///
/// Records live in a `HashMap` behind a `RwLock`, keyed by
/// [`StoreConfig::record_key`]. Clones share the same map.
///
/// # Note
///
/// Records are lost when the process restarts.
/// For persistent storage, use [`FileStore`](super::FileStore).
#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
    config: StoreConfig,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Number of records held. Expired records count until they are loaded
    /// or pruned.
    pub fn len(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live record exists for `id`.
    pub fn contains(&self, id: &SessionId) -> bool {
        let key = self.config.record_key(id);
        self.records
            .read()
            .map(|guard| {
                guard
                    .get(&key)
                    .is_some_and(|r| !is_expired(r.expires_at, Utc::now()))
            })
            .unwrap_or(false)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> SessionError {
    log::error!(target: "enclave_session", "msg=\"memory store lock poisoned\"");
    SessionError::StoreUnavailable("Lock poisoned".to_owned())
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        let key = self.config.record_key(id);
        let now = Utc::now();

        {
            let records = self.records.read().map_err(|_| poisoned())?;
            match records.get(&key) {
                None => return Err(SessionError::NotFound),
                Some(record) if !is_expired(record.expires_at, now) => {
                    return Ok(record.payload.clone());
                }
                Some(_) => {}
            }
        }

        // expired; a save may have refreshed it between the two locks
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records
            .get(&key)
            .is_some_and(|record| is_expired(record.expires_at, now))
        {
            records.remove(&key);
        }
        Err(SessionError::NotFound)
    }

    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        let record = Record {
            payload: payload.to_vec(),
            expires_at: self.config.expires_at(Utc::now()),
        };

        self.records
            .write()
            .map_err(|_| poisoned())?
            .insert(self.config.record_key(id), record);

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        self.records
            .write()
            .map_err(|_| poisoned())?
            .remove(&self.config.record_key(id));

        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn prune_expired(&self) -> Result<u64, SessionError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        let now = Utc::now();
        let before_count = records.len();

        records.retain(|_, record| !is_expired(record.expires_at, now));

        let pruned = before_count.saturating_sub(records.len());
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }
}
