use chrono::{DateTime, Utc};

use crate::IdOrigin;

/// Session lifecycle events fired by [`SessionManager`](crate::SessionManager).
///
/// Events carry an identifier prefix, never a full identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request without a usable identifier was given a new one.
    Issued { id_prefix: String, at: DateTime<Utc> },

    /// A presented identifier had a live record.
    Resolved { id_prefix: String, at: DateTime<Utc> },

    /// The identifier had no live record and was replaced. `origin` tells
    /// whether the replaced identifier came from the client or was issued
    /// during the same request.
    Rotated {
        previous_prefix: String,
        id_prefix: String,
        origin: IdOrigin,
        at: DateTime<Utc>,
    },

    Saved { id_prefix: String, at: DateTime<Utc> },

    Deleted { id_prefix: String, at: DateTime<Utc> },
}

impl SessionEvent {
    /// Dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issued { .. } => "session.issued",
            Self::Resolved { .. } => "session.resolved",
            Self::Rotated { .. } => "session.rotated",
            Self::Saved { .. } => "session.saved",
            Self::Deleted { .. } => "session.deleted",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Issued { at, .. }
            | Self::Resolved { at, .. }
            | Self::Rotated { at, .. }
            | Self::Saved { at, .. }
            | Self::Deleted { at, .. } => *at,
        }
    }

    /// Prefix of the identifier the event is about; for a rotation, the new one.
    pub fn id_prefix(&self) -> &str {
        match self {
            Self::Issued { id_prefix, .. }
            | Self::Resolved { id_prefix, .. }
            | Self::Rotated { id_prefix, .. }
            | Self::Saved { id_prefix, .. }
            | Self::Deleted { id_prefix, .. } => id_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();
        let prefix = || "abcdefgh".to_owned();

        assert_eq!(
            SessionEvent::Issued {
                id_prefix: prefix(),
                at: now
            }
            .name(),
            "session.issued"
        );
        assert_eq!(
            SessionEvent::Resolved {
                id_prefix: prefix(),
                at: now
            }
            .name(),
            "session.resolved"
        );
        assert_eq!(
            SessionEvent::Rotated {
                previous_prefix: prefix(),
                id_prefix: prefix(),
                origin: IdOrigin::Presented,
                at: now
            }
            .name(),
            "session.rotated"
        );
        assert_eq!(
            SessionEvent::Saved {
                id_prefix: prefix(),
                at: now
            }
            .name(),
            "session.saved"
        );
        assert_eq!(
            SessionEvent::Deleted {
                id_prefix: prefix(),
                at: now
            }
            .name(),
            "session.deleted"
        );
    }

    #[test]
    fn test_rotated_reports_new_prefix() {
        let now = Utc::now();
        let event = SessionEvent::Rotated {
            previous_prefix: "old-id-p".to_owned(),
            id_prefix: "new-id-p".to_owned(),
            origin: IdOrigin::Issued,
            at: now,
        };

        assert_eq!(event.id_prefix(), "new-id-p");
        assert_eq!(event.timestamp(), now);
    }
}
