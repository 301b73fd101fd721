//! Cookie transport for session identifiers.
//!
//! The HTTP layer is reached only through two small capabilities:
//! [`CookieSource`] reads a cookie from a request and [`CookieSink`] queues a
//! `Set-Cookie` on a response. [`RequestCookies`] and [`ResponseCookies`] are
//! framework-free implementations; the `actix` and `axum` features add
//! implementations for those frameworks' request and response types.

mod config;
mod signing;
mod transport;

pub use ::cookie::Cookie;
pub use config::{CookieConfig, MIN_SIGNING_SECRET_LEN, SameSite};
pub use signing::{sign_session_id, verify_signed_value};
pub use transport::CookieTransport;

use crate::SessionError;

/// Read access to the cookies of an incoming request.
pub trait CookieSource {
    /// Value of the first cookie called `name`, if any.
    ///
    /// Fails with [`SessionError::TransportUnreadable`] when the cookie is
    /// present but its value cannot be decoded. Unreadable cookies with other
    /// names do not affect the lookup.
    fn cookie_value(&self, name: &str) -> Result<Option<String>, SessionError>;
}

/// Write access to the cookies of an outgoing response.
pub trait CookieSink {
    /// Queues `cookie`, replacing any cookie of the same name queued earlier
    /// on this response.
    fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), SessionError>;
}

/// Cookies of a request, parsed from its `Cookie` header.
///
/// ```rust
/// use enclave_session::{CookieSource, RequestCookies};
///
/// let cookies = RequestCookies::parse(b"theme=dark; sid=abc");
/// assert_eq!(cookies.cookie_value("sid").unwrap().as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    /// `None` marks a pair whose name is readable but whose value is not.
    pairs: Vec<(String, Option<String>)>,
}

impl RequestCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw `Cookie` header value.
    ///
    /// Pairs are read one at a time. A malformed pair, or one whose name is
    /// not visible ASCII, is skipped without affecting its neighbours.
    pub fn parse(header: &[u8]) -> Self {
        let mut cookies = Self::new();
        cookies.extend_from_header(header);
        cookies
    }

    /// Adds the pairs of one more `Cookie` header.
    pub fn extend_from_header(&mut self, header: &[u8]) {
        for pair in header.split(|b| *b == b';') {
            let pair = pair.trim_ascii();
            if pair.is_empty() {
                continue;
            }

            let Some(eq) = pair.iter().position(|b| *b == b'=') else {
                log::debug!(target: "enclave_session", "msg=\"skipping cookie pair without '='\"");
                continue;
            };
            let (name, value) = (pair[..eq].trim_ascii(), pair[eq + 1..].trim_ascii());

            let Some(name) = visible_ascii(name).filter(|n| !n.is_empty()) else {
                log::debug!(target: "enclave_session", "msg=\"skipping cookie pair with unreadable name\"");
                continue;
            };

            let value = visible_ascii(strip_quotes(value)).map(ToOwned::to_owned);
            if value.is_none() {
                log::debug!(target: "enclave_session", "msg=\"cookie value is not visible ascii\", cookie=\"{name}\"");
            }
            self.pairs.push((name.to_owned(), value));
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), Some(value.into())));
        self
    }
}

impl CookieSource for RequestCookies {
    /// First readable value for `name`. Fails with
    /// [`SessionError::TransportUnreadable`] only when every pair called
    /// `name` has an undecodable value.
    fn cookie_value(&self, name: &str) -> Result<Option<String>, SessionError> {
        let mut unreadable = false;
        for (n, value) in &self.pairs {
            if n != name {
                continue;
            }
            match value {
                Some(value) => return Ok(Some(value.clone())),
                None => unreadable = true,
            }
        }

        if unreadable {
            return Err(SessionError::TransportUnreadable(format!(
                "cookie {name} has a value outside visible ASCII"
            )));
        }
        Ok(None)
    }
}

/// Cookies queued for a response.
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies {
    cookies: Vec<Cookie<'static>>,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Set-Cookie` header values, in queue order.
    pub fn header_values(&self) -> Vec<String> {
        self.cookies.iter().map(ToString::to_string).collect()
    }

    /// Copies the queued cookies onto a framework response.
    pub fn write_to<S: CookieSink + ?Sized>(&self, sink: &mut S) -> Result<(), SessionError> {
        for cookie in &self.cookies {
            sink.set_cookie(cookie.clone())?;
        }
        Ok(())
    }
}

impl CookieSink for ResponseCookies {
    fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), SessionError> {
        self.cookies.retain(|c| c.name() != cookie.name());
        self.cookies.push(cookie);
        Ok(())
    }
}

/// Whether a raw `Set-Cookie` value sets the cookie called `name`.
///
/// Works on bytes so that values which are not visible ASCII are compared
/// rather than discarded.
#[cfg(any(feature = "actix", feature = "axum"))]
pub(crate) fn sets_cookie_named(set_cookie: &[u8], name: &str) -> bool {
    let pair = set_cookie
        .split(|b| *b == b';')
        .next()
        .unwrap_or_default();
    pair.iter()
        .position(|b| *b == b'=')
        .is_some_and(|eq| pair[..eq].trim_ascii() == name.as_bytes())
}

fn visible_ascii(bytes: &[u8]) -> Option<&str> {
    if bytes.iter().all(|b| (0x21u8..0x7f).contains(b) || *b == b' ') {
        std::str::from_utf8(bytes).ok()
    } else {
        None
    }
}

fn strip_quotes(value: &[u8]) -> &[u8] {
    match value {
        [b'"', inner @ .., b'"'] => inner,
        _ => value,
    }
}
