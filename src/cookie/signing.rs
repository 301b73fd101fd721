//! Signed cookie values.
//!
//! A signed value has the shape `{session_id}.{hex(hmac_sha256(session_id))}`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{SecretString, SessionId};

type HmacSha256 = Hmac<Sha256>;

/// Signs a session ID with HMAC-SHA256.
pub fn sign_session_id(session_id: &SessionId, secret: &SecretString) -> String {
    let tag = mac(secret).chain_update(session_id.as_str().as_bytes()).finalize();
    format!("{}.{}", session_id, hex::encode(tag.into_bytes()))
}

/// Verifies a signed cookie value and extracts the session ID.
///
/// Returns `None` if the value is malformed or the tag does not match.
pub fn verify_signed_value(cookie_value: &str, secret: &SecretString) -> Option<SessionId> {
    let (session_id, tag_hex) = cookie_value.rsplit_once('.')?;
    let tag = hex::decode(tag_hex).ok()?;

    // verify_slice compares in constant time
    let verified = mac(secret)
        .chain_update(session_id.as_bytes())
        .verify_slice(&tag)
        .is_ok();

    if verified {
        Some(SessionId::from_client(session_id))
    } else {
        log::warn!(target: "enclave_session", "msg=\"session cookie tampered\" cookie_prefix=\"{}...\"", cookie_value.chars().take(8).collect::<String>());
        None
    }
}

fn mac(secret: &SecretString) -> HmacSha256 {
    // HMAC accepts keys of any length
    #[allow(clippy::expect_used)]
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::new("test-secret-key-that-is-long-enough")
    }

    #[test]
    fn test_sign_and_verify() {
        let id = SessionId::from_client("abc123session");
        let signed = sign_session_id(&id, &secret());

        assert!(signed.starts_with("abc123session."));
        assert_eq!(verify_signed_value(&signed, &secret()), Some(id));
    }

    #[test]
    fn test_tampered_tag() {
        let tampered = format!("abc123session.{}", "0".repeat(64));
        assert!(verify_signed_value(&tampered, &secret()).is_none());
    }

    #[test]
    fn test_swapped_session_id() {
        let signed = sign_session_id(&SessionId::from_client("abc123session"), &secret());
        let tag = signed.rsplit_once('.').unwrap().1;
        let forged = format!("forged-id.{tag}");

        assert!(verify_signed_value(&forged, &secret()).is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let other = SecretString::new("another-secret-key-that-is-long-enough");
        let signed = sign_session_id(&SessionId::from_client("abc123session"), &secret());

        assert!(verify_signed_value(&signed, &other).is_none());
    }

    #[test]
    fn test_malformed_values() {
        assert!(verify_signed_value("noseparator", &secret()).is_none());
        assert!(verify_signed_value("session.nothex", &secret()).is_none());
        assert!(verify_signed_value("", &secret()).is_none());
    }
}
