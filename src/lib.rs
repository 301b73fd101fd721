//! Server-side HTTP sessions.
//!
//! A request handler asks the [`SessionManager`] for the current session,
//! mutates the payload, and saves it back. The manager takes care of issuing
//! identifiers, moving them through a cookie, and rotating identifiers that
//! do not resolve to stored data.
//!
//! ```rust,ignore
//! use enclave_session::{MemoryStore, RequestContext, SessionConfig, SessionManager};
//!
//! let config = SessionConfig::new("sid");
//! let manager = SessionManager::from_config(&config, MemoryStore::with_config(config.store.clone()))?;
//!
//! let ctx = RequestContext::new();
//! let session = manager.load_or_new::<Counter, _, _>(&ctx, &request, &mut response).await?;
//! let mut counter = session.data.unwrap_or_default();
//! counter.value += 1;
//! manager.save(&ctx, &mut response, &session.id, &counter).await?;
//! ```

use std::fmt;

pub mod codec;
pub mod config;
pub mod context;
pub mod cookie;
pub mod events;
pub mod id;
pub mod manager;
pub mod secret;
pub mod store;
pub mod transport;

#[cfg(any(feature = "actix", feature = "axum"))]
pub mod api;

pub use codec::{JsonCodec, PayloadCodec};
pub use config::SessionConfig;
pub use context::{Canceller, RequestContext};
pub use crate::cookie::{
    CookieConfig, CookieSink, CookieSource, CookieTransport, RequestCookies, ResponseCookies,
    SameSite,
};
pub use events::{Listener, SessionEvent, register_event_listeners};
pub use id::{IdConfig, IdEncoding, IdGenerator, SessionId};
pub use manager::{LoadState, SessionLoad, SessionManager};
pub use secret::SecretString;
#[cfg(any(test, feature = "mocks"))]
pub use store::MockSessionStore;
#[cfg(feature = "sqlx_postgres")]
pub use store::PostgresStore;
#[cfg(feature = "redis")]
pub use store::RedisStore;
#[cfg(feature = "sqlx_sqlite")]
pub use store::SqliteStore;
pub use store::{FileStore, KeyFormat, MemoryStore, SessionStore, StoreConfig};
pub use transport::{IdOrigin, SessionTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No live record exists for the identifier.
    NotFound,
    RandomnessUnavailable(String),
    TransportUnreadable(String),
    TransportWrite(String),
    StoreUnavailable(String),
    Timeout,
    Cancelled,
    Codec(String),
    Configuration(String),
    /// Outcome of a delete where at least one half failed.
    Combined {
        store: Option<Box<SessionError>>,
        transport: Option<Box<SessionError>>,
    },
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound)
    }
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "Session not found"),
            SessionError::RandomnessUnavailable(msg) => {
                write!(f, "Secure randomness unavailable: {}", msg)
            }
            SessionError::TransportUnreadable(msg) => {
                write!(f, "Session binding could not be read: {}", msg)
            }
            SessionError::TransportWrite(msg) => {
                write!(f, "Session binding could not be written: {}", msg)
            }
            SessionError::StoreUnavailable(msg) => write!(f, "Session store error: {}", msg),
            SessionError::Timeout => write!(f, "Session store operation timed out"),
            SessionError::Cancelled => write!(f, "Session operation cancelled"),
            SessionError::Codec(msg) => write!(f, "Session payload codec error: {}", msg),
            SessionError::Configuration(msg) => write!(f, "Invalid session configuration: {}", msg),
            SessionError::Combined { store, transport } => {
                write!(f, "Session delete failed")?;
                if let Some(err) = store {
                    write!(f, "; store: {}", err)?;
                }
                if let Some(err) = transport {
                    write!(f, "; transport: {}", err)?;
                }
                Ok(())
            }
        }
    }
}
