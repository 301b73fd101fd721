//! actix-web integration.
//!
//! `HttpRequest` reads the session cookie and `HttpResponse` takes the
//! `Set-Cookie` bindings, so both can be handed straight to
//! [`SessionManager`](crate::SessionManager). Handlers can return
//! `Result<_, SessionHttpError>` and use `?` on session calls.

use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use super::{ErrorResponse, SessionHttpError, invalid_header, status_code};
use crate::cookie::{Cookie, CookieSink, CookieSource, RequestCookies, sets_cookie_named};
use crate::SessionError;

/// Parses every `Cookie` header of a request.
pub fn request_cookies(headers: &HeaderMap) -> RequestCookies {
    let mut cookies = RequestCookies::new();
    for value in headers.get_all(header::COOKIE) {
        cookies.extend_from_header(value.as_bytes());
    }
    cookies
}

impl CookieSource for HttpRequest {
    fn cookie_value(&self, name: &str) -> Result<Option<String>, SessionError> {
        request_cookies(self.headers()).cookie_value(name)
    }
}

impl<B> CookieSink for HttpResponse<B> {
    fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(&cookie.to_string()).map_err(invalid_header)?;

        let headers = self.headers_mut();
        let kept: Vec<HeaderValue> = headers
            .get_all(header::SET_COOKIE)
            .filter(|existing| !sets_cookie_named(existing.as_bytes(), cookie.name()))
            .cloned()
            .collect();

        let _ = headers.remove(header::SET_COOKIE);
        for existing in kept {
            headers.append(header::SET_COOKIE, existing);
        }
        headers.append(header::SET_COOKIE, value);
        Ok(())
    }
}

impl ResponseError for SessionHttpError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(status_code(&self.0)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(ErrorResponse::from(&self.0))
    }
}
