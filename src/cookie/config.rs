use chrono::Duration;

use crate::{SecretString, SessionError};

/// Minimum length of the cookie signing key in bytes.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    Lax,
    #[default]
    Strict,
}

impl From<SameSite> for ::cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::None => ::cookie::SameSite::None,
            SameSite::Lax => ::cookie::SameSite::Lax,
            SameSite::Strict => ::cookie::SameSite::Strict,
        }
    }
}

/// How the session cookie is written.
///
/// There is no default cookie name; it must be chosen by the integrator.
///
/// ```rust
/// use enclave_session::CookieConfig;
///
/// let config = CookieConfig::new("sid");
/// assert_eq!(config.path, "/");
/// assert!(config.secure && config.http_only);
/// ```
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
    /// Cookie lifetime. Written as Max-Age in whole seconds, truncated
    /// toward zero. `None` leaves the cookie scoped to the browser session.
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// When set, cookie values carry an HMAC-SHA256 tag of the identifier.
    pub signing_secret: Option<SecretString>,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: "/".to_owned(),
            domain: None,
            max_age: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
            signing_secret: None,
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.name.is_empty() {
            return Err(SessionError::Configuration(
                "cookie name must not be empty".to_owned(),
            ));
        }
        if !self.name.bytes().all(is_token_byte) {
            return Err(SessionError::Configuration(format!(
                "cookie name {:?} contains characters not allowed in a cookie name",
                self.name
            )));
        }
        if self.max_age.is_some_and(|age| age < Duration::zero()) {
            return Err(SessionError::Configuration(
                "cookie max_age must not be negative".to_owned(),
            ));
        }
        if self.same_site == SameSite::None && !self.secure {
            return Err(SessionError::Configuration(
                "SameSite=None cookies must be secure".to_owned(),
            ));
        }
        if let Some(secret) = &self.signing_secret {
            if secret.len() < MIN_SIGNING_SECRET_LEN {
                return Err(SessionError::Configuration(format!(
                    "signing_secret should be at least {MIN_SIGNING_SECRET_LEN} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Max-Age in whole seconds, or `None` when the attribute is omitted.
    pub fn max_age_secs(&self) -> Option<i64> {
        self.max_age
            .map(|age| age.num_seconds())
            .filter(|secs| *secs > 0)
    }
}

// RFC 6265 cookie-name: an RFC 2616 token
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}
