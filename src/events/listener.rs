use async_trait::async_trait;

use super::SessionEvent;

/// Handles session events asynchronously.
///
/// Listeners run inline on the request path, in registration order, so
/// slow work should be handed off to a task.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &SessionEvent);
}
