//! axum integration.
//!
//! Request headers act as the cookie source and response headers as the
//! sink. Handlers can return `Result<_, SessionHttpError>` and use `?` on
//! session calls.

use axum::Json;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::{ErrorResponse, SessionHttpError, invalid_header, status_code};
use crate::cookie::{Cookie, CookieSink, CookieSource, RequestCookies, sets_cookie_named};
use crate::SessionError;

impl CookieSource for HeaderMap {
    fn cookie_value(&self, name: &str) -> Result<Option<String>, SessionError> {
        let mut cookies = RequestCookies::new();
        for value in self.get_all(header::COOKIE) {
            cookies.extend_from_header(value.as_bytes());
        }
        cookies.cookie_value(name)
    }
}

impl CookieSink for HeaderMap {
    fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(&cookie.to_string()).map_err(invalid_header)?;

        let kept: Vec<HeaderValue> = self
            .get_all(header::SET_COOKIE)
            .iter()
            .filter(|existing| !sets_cookie_named(existing.as_bytes(), cookie.name()))
            .cloned()
            .collect();

        self.remove(header::SET_COOKIE);
        for existing in kept {
            self.append(header::SET_COOKIE, existing);
        }
        self.append(header::SET_COOKIE, value);
        Ok(())
    }
}

impl CookieSink for Response {
    fn set_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), SessionError> {
        self.headers_mut().set_cookie(cookie)
    }
}

impl IntoResponse for SessionHttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(status_code(&self.0)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}
