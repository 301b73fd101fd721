//! Session lifecycle events.
//!
//! The manager fires an event for every identifier it issues, resolves,
//! rotates, saves or deletes. If no listeners are registered, events are
//! dropped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use enclave_session::register_event_listeners;
//! use enclave_session::events::listeners::LoggingListener;
//!
//! fn main() {
//!     register_event_listeners(|registry| {
//!         registry.listen(LoggingListener::new());
//!     });
//! }
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use enclave_session::events::{Listener, SessionEvent};
//! use async_trait::async_trait;
//!
//! struct RotationCounter;
//!
//! #[async_trait]
//! impl Listener for RotationCounter {
//!     async fn handle(&self, event: &SessionEvent) {
//!         if let SessionEvent::Rotated { .. } = event {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::SessionEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
