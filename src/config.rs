//! Configuration for identifiers, the session cookie, and storage.
//!
//! # Example
//!
//! ```rust
//! use enclave_session::{SameSite, SessionConfig, StoreConfig};
//! use chrono::Duration;
//!
//! // Use defaults
//! let config = SessionConfig::new("sid");
//!
//! // Or customize
//! let mut config = SessionConfig::new("sid");
//! config.cookie.same_site = SameSite::Lax;
//! config.store = StoreConfig {
//!     ttl: Some(Duration::hours(8)),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::cookie::{CookieConfig, SameSite};
use crate::id::IdConfig;
use crate::store::StoreConfig;
use crate::SessionError;

/// Everything a cookie-backed [`SessionManager`](crate::SessionManager) needs.
///
/// Each part has its own defaults; only the cookie name has to be chosen.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub id: IdConfig,
    pub cookie: CookieConfig,
    pub store: StoreConfig,
}

impl SessionConfig {
    /// Production defaults: 128-bit identifiers, a secure `HttpOnly`
    /// `SameSite=Strict` cookie and 24 hour records.
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            id: IdConfig::default(),
            cookie: CookieConfig::new(cookie_name),
            store: StoreConfig::default(),
        }
    }

    /// Creates a configuration suitable for local development.
    ///
    /// Cookies are sent over plain HTTP, use `SameSite=Lax`, and records
    /// expire after an hour.
    pub fn development(cookie_name: impl Into<String>) -> Self {
        let mut config = Self::new(cookie_name);
        config.cookie.secure = false;
        config.cookie.same_site = SameSite::Lax;
        config.store.ttl = Some(Duration::hours(1));
        config
    }

    /// Creates a configuration with stricter security settings.
    ///
    /// 256-bit identifiers, and both the record and the cookie live for two
    /// hours after the last save.
    pub fn strict(cookie_name: impl Into<String>) -> Self {
        let mut config = Self::new(cookie_name);
        config.id.byte_len = 32;
        config.cookie.max_age = Some(Duration::hours(2));
        config.cookie.same_site = SameSite::Strict;
        config.store.ttl = Some(Duration::hours(2));
        config
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        self.id.validate()?;
        self.cookie.validate()?;
        self.store.validate()?;

        if let (Some(cookie), Some(ttl)) = (self.cookie.max_age, self.store.ttl) {
            if cookie > ttl {
                log::warn!(
                    target: "enclave_session",
                    "msg=\"cookie max_age outlives store ttl, clients will present expired ids\""
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::new("sid");

        assert_eq!(config.id.byte_len, 16);
        assert_eq!(config.cookie.name, "sid");
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.same_site, SameSite::Strict);
        assert_eq!(config.store.ttl, Some(Duration::hours(24)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = SessionConfig::development("sid");

        assert!(!config.cookie.secure);
        assert_eq!(config.cookie.same_site, SameSite::Lax);
        assert_eq!(config.store.ttl, Some(Duration::hours(1)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = SessionConfig::strict("__Host-sid");

        assert_eq!(config.id.byte_len, 32);
        assert_eq!(config.cookie.max_age, Some(Duration::hours(2)));
        assert_eq!(config.store.ttl, Some(Duration::hours(2)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_bad_part() {
        let mut config = SessionConfig::new("sid");
        config.id.byte_len = 8;
        assert!(matches!(
            config.validate(),
            Err(SessionError::Configuration(_))
        ));

        assert!(SessionConfig::new("").validate().is_err());
    }
}
