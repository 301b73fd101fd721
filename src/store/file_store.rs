//! File-based session storage.
//!
//! Stores each record as a JSON file in a directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionStore, StoreConfig, is_expired};
use crate::{SessionError, SessionId};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Base64 of the encoded payload.
    payload: String,
    expires_at: Option<DateTime<Utc>>,
}

/// File-based session storage.
///
/// Each record is stored as `{record_key}.json` in the configured directory,
/// with `:` written as `.` so names stay valid on every platform. Keys never
/// contain `.`, so distinct keys keep distinct file names.
/// Writes go to a temporary file that is then renamed over the record, so a
/// concurrent reader sees either the old or the new record.
///
/// # Example
///
/// ```rust,ignore
/// use enclave_session::FileStore;
///
/// let store = FileStore::new("/var/lib/myapp/sessions")?;
/// ```
pub struct FileStore {
    directory: PathBuf,
    config: StoreConfig,
}

impl FileStore {
    /// Creates a file store, creating the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StoreUnavailable` if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, SessionError> {
        Self::with_config(directory, StoreConfig::default())
    }

    pub fn with_config(
        directory: impl Into<PathBuf>,
        config: StoreConfig,
    ) -> Result<Self, SessionError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| {
            log::error!(target: "enclave_session", "msg=\"failed to create session directory\", error=\"{e}\"");
            SessionError::StoreUnavailable(format!("Failed to create session directory: {e}"))
        })?;
        Ok(Self { directory, config })
    }

    /// Path of the record for `id`, or `None` if its key is not a safe file name.
    fn record_path(&self, id: &SessionId) -> Option<PathBuf> {
        let key = self.config.record_key(id);
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
        safe.then(|| {
            self.directory
                .join(format!("{}.json", key.replace(':', ".")))
        })
    }

    async fn read_envelope(path: &PathBuf) -> Result<Option<Envelope>, SessionError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                log::error!(target: "enclave_session", "msg=\"failed to read session file\", error=\"{e}\"");
                return Err(SessionError::StoreUnavailable(format!(
                    "Failed to read session file: {e}"
                )));
            }
        };

        serde_json::from_slice(&content).map(Some).map_err(|e| {
            log::error!(target: "enclave_session", "msg=\"failed to parse session file\", error=\"{e}\"");
            SessionError::StoreUnavailable(format!("Failed to parse session file: {e}"))
        })
    }
}

fn write_error(e: &std::io::Error) -> SessionError {
    log::error!(target: "enclave_session", "msg=\"failed to write session file\", error=\"{e}\"");
    SessionError::StoreUnavailable(format!("Failed to write session file: {e}"))
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        let Some(path) = self.record_path(id) else {
            return Err(SessionError::NotFound);
        };

        let Some(envelope) = Self::read_envelope(&path).await? else {
            return Err(SessionError::NotFound);
        };
        if is_expired(envelope.expires_at, Utc::now()) {
            return Err(SessionError::NotFound);
        }

        STANDARD.decode(envelope.payload).map_err(|e| {
            log::error!(target: "enclave_session", "msg=\"corrupt session file payload\", error=\"{e}\"");
            SessionError::StoreUnavailable(format!("Corrupt session file payload: {e}"))
        })
    }

    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        let Some(path) = self.record_path(id) else {
            return Err(SessionError::StoreUnavailable(
                "session id is not usable as a file name".to_owned(),
            ));
        };

        let envelope = Envelope {
            payload: STANDARD.encode(payload),
            expires_at: self.config.expires_at(Utc::now()),
        };
        let content = serde_json::to_vec(&envelope).map_err(|e| {
            SessionError::StoreUnavailable(format!("Failed to serialize session file: {e}"))
        })?;

        let temp = path.with_extension(format!("tmp-{:016x}", rand::random::<u64>()));
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| write_error(&e))?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_error(&e));
        }

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        let Some(path) = self.record_path(id) else {
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                log::error!(target: "enclave_session", "msg=\"failed to delete session file\", error=\"{e}\"");
                Err(SessionError::StoreUnavailable(format!(
                    "Failed to delete session file: {e}"
                )))
            }
        }
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        let mut entries = tokio::fs::read_dir(&self.directory).await.map_err(|e| {
            SessionError::StoreUnavailable(format!("Failed to read session directory: {e}"))
        })?;

        let now = Utc::now();
        let mut pruned = 0u64;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            if let Ok(Some(envelope)) = Self::read_envelope(&path).await {
                if is_expired(envelope.expires_at, now)
                    && tokio::fs::remove_file(&path).await.is_ok()
                {
                    pruned += 1;
                }
            }
        }

        Ok(pruned)
    }
}
