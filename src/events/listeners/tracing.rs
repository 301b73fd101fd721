use async_trait::async_trait;

use crate::events::{Listener, SessionEvent};

/// Emits session events as tracing events. Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &SessionEvent) {
        tracing::info!(
            target: "enclave_session::events",
            event_name = event.name(),
            id_prefix = event.id_prefix(),
            ?event,
            "session event"
        );
    }
}
