//! Per-request deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::SessionError;

/// Ambient deadline and cancellation signal for one request.
///
/// Every store call the manager makes is raced against both. A request that
/// is cancelled or runs out of time fails with [`SessionError::Cancelled`] or
/// [`SessionError::Timeout`], never with [`SessionError::NotFound`].
///
/// ```rust
/// use std::time::Duration;
/// use enclave_session::RequestContext;
///
/// let (ctx, canceller) = RequestContext::new()
///     .with_timeout(Duration::from_secs(2))
///     .with_cancellation();
/// canceller.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

/// Fires the cancellation signal of the [`RequestContext`] it was created with.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Attaches a cancellation signal and returns the handle that fires it.
    #[must_use]
    pub fn with_cancellation(mut self) -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        self.cancel_rx = Some(rx);
        (self, Canceller { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancelled. Never resolves without a signal attached or
    /// after the [`Canceller`] is dropped unfired.
    async fn cancelled(&self) {
        if let Some(rx) = &self.cancel_rx {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }

    /// Runs a store operation under the request's cancellation signal and the
    /// earlier of `limit` and the request deadline.
    pub(crate) async fn run<F, T>(&self, limit: Duration, op: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        let deadline = match (Instant::now().checked_add(limit), self.deadline) {
            (Some(own), Some(request)) => Some(own.min(request)),
            (own, request) => own.or(request),
        };

        tokio::select! {
            biased;
            () = self.cancelled() => Err(SessionError::Cancelled),
            res = bounded(deadline, op) => res,
        }
    }
}

async fn bounded<F, T>(deadline: Option<Instant>, op: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, op)
            .await
            .unwrap_or(Err(SessionError::Timeout)),
        None => op.await,
    }
}
