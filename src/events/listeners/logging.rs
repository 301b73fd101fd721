use async_trait::async_trait;

use crate::events::{Listener, SessionEvent};

/// Logs session events with the `log` crate.
///
/// Rotations of a presented identifier are logged at `Warn` regardless of
/// the configured level, since they indicate an unknown or expired session
/// cookie.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Logs at `Info`.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &SessionEvent) -> log::Level {
        match event {
            SessionEvent::Rotated {
                origin: crate::IdOrigin::Presented,
                ..
            } => self.level.min(log::Level::Warn),
            _ => self.level,
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &SessionEvent) {
        log::log!(
            target: "enclave_session::events",
            self.level_for(event),
            "event={} id_prefix=\"{}\" at=\"{}\"",
            event.name(),
            event.id_prefix(),
            event.timestamp().to_rfc3339()
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::IdOrigin;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::new().level, log::Level::Info);
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[test]
    fn test_presented_rotation_is_at_least_warn() {
        let listener = LoggingListener::with_level(log::Level::Debug);
        let rotated = |origin| SessionEvent::Rotated {
            previous_prefix: "aaaaaaaa".to_owned(),
            id_prefix: "bbbbbbbb".to_owned(),
            origin,
            at: Utc::now(),
        };

        assert_eq!(
            listener.level_for(&rotated(IdOrigin::Presented)),
            log::Level::Warn
        );
        assert_eq!(
            listener.level_for(&rotated(IdOrigin::Issued)),
            log::Level::Debug
        );

        let quiet = LoggingListener::with_level(log::Level::Error);
        assert_eq!(
            quiet.level_for(&rotated(IdOrigin::Presented)),
            log::Level::Error
        );
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let event = SessionEvent::Issued {
            id_prefix: "abcdefgh".to_owned(),
            at: Utc::now(),
        };

        LoggingListener::new().handle(&event).await;
    }
}
