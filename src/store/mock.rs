#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{MemoryStore, SessionStore};
use crate::{SessionError, SessionId};

#[derive(Default)]
struct Failures {
    load: Option<SessionError>,
    save: Option<SessionError>,
    delete: Option<SessionError>,
    delay: Option<Duration>,
}

/// In-memory store with injectable failures and call counters.
///
/// Clones share records, failures and counters.
#[derive(Clone, Default)]
pub struct MockSessionStore {
    pub inner: MemoryStore,
    failures: Arc<Mutex<Failures>>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following `load` fails with `error`; `None` clears the failure.
    pub fn fail_load(&self, error: Option<SessionError>) {
        self.failures.lock().unwrap().load = error;
    }

    pub fn fail_save(&self, error: Option<SessionError>) {
        self.failures.lock().unwrap().save = error;
    }

    pub fn fail_delete(&self, error: Option<SessionError>) {
        self.failures.lock().unwrap().delete = error;
    }

    /// Every following call sleeps for `delay` before doing anything.
    pub fn delay(&self, delay: Option<Duration>) {
        self.failures.lock().unwrap().delay = delay;
    }

    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = self.failures.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<u8>, SessionError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let failure = self.failures.lock().unwrap().load.clone();
        match failure {
            Some(error) => Err(error),
            None => self.inner.load(id).await,
        }
    }

    async fn save(&self, id: &SessionId, payload: &[u8]) -> Result<(), SessionError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let failure = self.failures.lock().unwrap().save.clone();
        match failure {
            Some(error) => Err(error),
            None => self.inner.save(id, payload).await,
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let failure = self.failures.lock().unwrap().delete.clone();
        match failure {
            Some(error) => Err(error),
            None => self.inner.delete(id).await,
        }
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        self.inner.prune_expired().await
    }
}
