//! Identifier transport contract.

use crate::SessionError;
use crate::cookie::{CookieSink, CookieSource};
use crate::id::{IdGenerator, SessionId};

/// Where the identifier returned by [`SessionTransport::get_or_issue`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdOrigin {
    /// The client presented it. It is untrusted until it resolves in the store.
    Presented,
    /// Freshly issued and already written to the response.
    Issued,
}

/// Moves session identifiers between the client and the server.
///
/// Implementations decide how a binding is encoded (a cookie, by default)
/// but never what the identifier's value is.
pub trait SessionTransport: Send + Sync {
    /// Reads the identifier bound to the request. When none is bound, issues
    /// one and writes it to `response` before returning it.
    ///
    /// Writes to `response` exactly once when issuing and never otherwise.
    fn get_or_issue(
        &self,
        request: &dyn CookieSource,
        response: &mut dyn CookieSink,
    ) -> Result<(SessionId, IdOrigin), SessionError>;

    /// Writes the binding for `id` with a refreshed lifetime.
    fn write(&self, response: &mut dyn CookieSink, id: &SessionId) -> Result<(), SessionError>;

    /// Tells the client to discard its binding. Idempotent.
    fn delete(&self, response: &mut dyn CookieSink) -> Result<(), SessionError>;

    /// Generator used for issuance.
    fn generator(&self) -> &IdGenerator;
}
