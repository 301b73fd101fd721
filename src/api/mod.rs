//! Web framework integration.
//!
//! The `actix` and `axum` features let framework request and response types
//! act as [`CookieSource`](crate::CookieSource) and
//! [`CookieSink`](crate::CookieSink), and turn [`SessionError`] into HTTP
//! responses.

use serde::Serialize;

use crate::SessionError;

#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "axum")]
pub mod axum;

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        let code = match err {
            SessionError::NotFound => "SESSION_NOT_FOUND",
            SessionError::RandomnessUnavailable(_) => "RANDOMNESS_UNAVAILABLE",
            SessionError::TransportUnreadable(_) => "COOKIE_UNREADABLE",
            SessionError::TransportWrite(_) => "COOKIE_WRITE_FAILED",
            SessionError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            SessionError::Timeout => "STORE_TIMEOUT",
            SessionError::Cancelled => "CANCELLED",
            SessionError::Codec(_) => "PAYLOAD_CODEC_ERROR",
            SessionError::Configuration(_) => "CONFIGURATION_ERROR",
            SessionError::Combined { .. } => "DELETE_FAILED",
        };

        // store and codec details stay in the logs
        let error = match err {
            SessionError::StoreUnavailable(_) | SessionError::Codec(_) => {
                "Session storage failed".to_owned()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            error,
            code: code.to_owned(),
        }
    }
}

/// HTTP status for a session failure.
pub fn status_code(err: &SessionError) -> u16 {
    match err {
        SessionError::TransportUnreadable(_) => 400,
        SessionError::StoreUnavailable(_) | SessionError::Timeout => 503,
        SessionError::Combined { store, .. } if store.is_some() => 503,
        _ => 500,
    }
}

/// Wraps a [`SessionError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct SessionHttpError(pub SessionError);

impl From<SessionError> for SessionHttpError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for SessionHttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(any(feature = "actix", feature = "axum"))]
fn invalid_header(e: impl std::fmt::Display) -> SessionError {
    log::error!(target: "enclave_session", "msg=\"failed to write set-cookie header\", error=\"{e}\"");
    SessionError::TransportWrite(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_code(&SessionError::TransportUnreadable("x".to_owned())),
            400
        );
        assert_eq!(status_code(&SessionError::Timeout), 503);
        assert_eq!(status_code(&SessionError::Cancelled), 500);
        assert_eq!(
            status_code(&SessionError::Combined {
                store: None,
                transport: Some(Box::new(SessionError::TransportWrite("x".to_owned()))),
            }),
            500
        );
    }

    #[test]
    fn test_error_response_hides_store_details() {
        let body = ErrorResponse::from(&SessionError::StoreUnavailable(
            "connection refused to 10.0.0.3".to_owned(),
        ));
        assert_eq!(body.code, "STORE_UNAVAILABLE");
        assert!(!body.error.contains("10.0.0.3"));
    }
}
