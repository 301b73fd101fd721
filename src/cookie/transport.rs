use ::cookie::Cookie;

use super::config::CookieConfig;
use super::signing::{sign_session_id, verify_signed_value};
use super::{CookieSink, CookieSource};
use crate::transport::{IdOrigin, SessionTransport};
use crate::{IdGenerator, SessionError, SessionId};

/// Carries the session identifier in a cookie.
///
/// # Example
///
/// ```rust
/// use enclave_session::{
///     CookieConfig, CookieTransport, IdGenerator, IdOrigin, RequestCookies, ResponseCookies,
///     SessionTransport,
/// };
///
/// let transport = CookieTransport::new(CookieConfig::new("sid"), IdGenerator::default()).unwrap();
///
/// let mut response = ResponseCookies::new();
/// let (id, origin) = transport.get_or_issue(&RequestCookies::new(), &mut response).unwrap();
/// assert_eq!(origin, IdOrigin::Issued);
/// assert_eq!(response.get("sid").unwrap().value(), id.as_str());
/// ```
#[derive(Debug, Clone)]
pub struct CookieTransport {
    config: CookieConfig,
    generator: IdGenerator,
}

impl CookieTransport {
    /// Creates a cookie transport.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if the cookie configuration is invalid.
    pub fn new(config: CookieConfig, generator: IdGenerator) -> Result<Self, SessionError> {
        config.validate()?;
        generator.config().validate()?;
        Ok(Self { config, generator })
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    fn read(&self, request: &dyn CookieSource) -> Result<Option<SessionId>, SessionError> {
        let Some(raw) = request.cookie_value(&self.config.name)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        Ok(match &self.config.signing_secret {
            Some(secret) => verify_signed_value(&raw, secret),
            None => Some(SessionId::from_client(raw)),
        })
    }

    fn binding(&self, id: &SessionId) -> Cookie<'static> {
        let value = match &self.config.signing_secret {
            Some(secret) => sign_session_id(id, secret),
            None => id.as_str().to_owned(),
        };

        let mut cookie = self.base_cookie(value);
        if let Some(secs) = self.config.max_age_secs() {
            cookie.set_max_age(::cookie::time::Duration::seconds(secs));
        }
        cookie
    }

    fn removal(&self) -> Cookie<'static> {
        let mut cookie = self.base_cookie(String::new());
        cookie.make_removal();
        cookie
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.config.name.clone(), value))
            .path(self.config.path.clone())
            .secure(self.config.secure)
            .http_only(self.config.http_only)
            .same_site(self.config.same_site.into())
            .build();

        if let Some(ref domain) = self.config.domain {
            cookie.set_domain(domain.clone());
        }

        cookie
    }
}

impl SessionTransport for CookieTransport {
    fn get_or_issue(
        &self,
        request: &dyn CookieSource,
        response: &mut dyn CookieSink,
    ) -> Result<(SessionId, IdOrigin), SessionError> {
        if let Some(id) = self.read(request)? {
            return Ok((id, IdOrigin::Presented));
        }

        let id = self.generator.issue()?;
        self.write(response, &id)?;
        log::debug!(target: "enclave_session", "msg=\"session id issued\" id_prefix=\"{}\"", id.log_prefix());
        Ok((id, IdOrigin::Issued))
    }

    fn write(&self, response: &mut dyn CookieSink, id: &SessionId) -> Result<(), SessionError> {
        response.set_cookie(self.binding(id))
    }

    fn delete(&self, response: &mut dyn CookieSink) -> Result<(), SessionError> {
        response.set_cookie(self.removal())
    }

    fn generator(&self) -> &IdGenerator {
        &self.generator
    }
}
