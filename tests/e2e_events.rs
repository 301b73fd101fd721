//! Session events reach registered listeners.
//!
//! Listeners are registered once per process, so these tests share one
//! recorder and run serially.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use enclave_session::events::listeners::LoggingListener;
use enclave_session::{
    IdOrigin, Listener, MemoryStore, SessionTransport, RequestContext, RequestCookies, ResponseCookies,
    SessionConfig, SessionEvent, SessionManager, register_event_listeners,
};
use serial_test::serial;

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

#[async_trait]
impl Listener for Recorder {
    async fn handle(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn recorder() -> &'static Recorder {
    static RECORDER: OnceLock<Recorder> = OnceLock::new();
    RECORDER.get_or_init(|| {
        let recorder = Recorder::default();
        let listener = recorder.clone();
        register_event_listeners(move |registry| {
            registry.listen(LoggingListener::new()).listen(listener);
        });
        recorder
    })
}

fn take_names() -> Vec<&'static str> {
    recorder()
        .events
        .lock()
        .unwrap()
        .drain(..)
        .map(|e| e.name())
        .collect()
}

#[tokio::test]
#[serial]
async fn test_fresh_visit_events() {
    let recorder = recorder();
    recorder.events.lock().unwrap().clear();
    let manager = SessionManager::from_config(&SessionConfig::new("sid"), MemoryStore::new()).unwrap();
    let ctx = RequestContext::new();
    let mut response = ResponseCookies::new();

    let session = manager
        .load_or_new::<u32, _, _>(&ctx, &RequestCookies::new(), &mut response)
        .await
        .unwrap();
    manager.save(&ctx, &mut response, &session.id, &1u32).await.unwrap();

    assert_eq!(
        take_names(),
        vec!["session.issued", "session.rotated", "session.saved"]
    );
}

#[tokio::test]
#[serial]
async fn test_forged_id_rotation_event() {
    let recorder = recorder();
    recorder.events.lock().unwrap().clear();
    let manager = SessionManager::from_config(&SessionConfig::new("sid"), MemoryStore::new()).unwrap();

    let session = manager
        .load_or_new::<u32, _, _>(
            &RequestContext::new(),
            &RequestCookies::new().with("sid", "forged-identifier"),
            &mut ResponseCookies::new(),
        )
        .await
        .unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    match &events[0] {
        SessionEvent::Rotated {
            previous_prefix,
            id_prefix,
            origin,
            ..
        } => {
            assert_eq!(previous_prefix, "forged-i");
            assert_eq!(*origin, IdOrigin::Presented);
            assert!(session.id.as_str().starts_with(id_prefix.as_str()));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_resolve_and_delete_events() {
    let recorder = recorder();
    let manager = SessionManager::from_config(&SessionConfig::new("sid"), MemoryStore::new()).unwrap();
    let ctx = RequestContext::new();
    let id = manager.transport().generator().issue().unwrap();
    manager.save(&ctx, &mut ResponseCookies::new(), &id, &1u32).await.unwrap();
    recorder.events.lock().unwrap().clear();

    let request = RequestCookies::new().with("sid", id.as_str());
    let session = manager
        .load_or_new::<u32, _, _>(&ctx, &request, &mut ResponseCookies::new())
        .await
        .unwrap();
    manager.delete(&ctx, &mut ResponseCookies::new(), &session.id).await.unwrap();

    assert_eq!(take_names(), vec!["session.resolved", "session.deleted"]);
}
