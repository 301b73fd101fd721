//! Session identifier generation.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::SessionError;

/// Fewest random bytes an identifier may carry (128 bits).
pub const MIN_ID_BYTES: usize = 16;

/// An opaque session identifier.
///
/// Values produced by [`IdGenerator`] only contain URL-safe characters and
/// never contain cookie framing characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a value read back from a client.
    ///
    /// Nothing is validated here: an untrusted value only becomes the
    /// session's identifier once it resolves in the store.
    pub fn from_client(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// First characters of the identifier, for log lines.
    pub(crate) fn log_prefix(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Text encoding applied to the random bytes of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdEncoding {
    /// URL-safe base64 without padding.
    #[default]
    Base64Url,
    /// Lowercase hexadecimal.
    Hex,
}

impl IdEncoding {
    fn encode(self, bytes: &[u8]) -> String {
        match self {
            IdEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
            IdEncoding::Hex => hex::encode(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdConfig {
    /// Number of random bytes per identifier.
    ///
    /// Default: 16
    pub byte_len: usize,

    /// Default: [`IdEncoding::Base64Url`]
    pub encoding: IdEncoding,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            byte_len: MIN_ID_BYTES,
            encoding: IdEncoding::Base64Url,
        }
    }
}

impl IdConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.byte_len < MIN_ID_BYTES {
            return Err(SessionError::Configuration(format!(
                "identifier byte length must be at least {MIN_ID_BYTES}, got {}",
                self.byte_len
            )));
        }
        Ok(())
    }
}

/// Issues identifiers from the operating system's random source.
///
/// # Example
///
/// ```rust
/// use enclave_session::{IdConfig, IdGenerator};
///
/// let generator = IdGenerator::new(IdConfig::default());
/// let id = generator.issue().unwrap();
/// assert_eq!(id.as_str().len(), 22);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    config: IdConfig,
}

impl IdGenerator {
    pub fn new(config: IdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IdConfig {
        &self.config
    }

    /// Issues a new identifier.
    ///
    /// Fails only when the OS random source cannot be read.
    pub fn issue(&self) -> Result<SessionId, SessionError> {
        let mut buf = vec![0u8; self.config.byte_len.max(MIN_ID_BYTES)];
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            log::error!(target: "enclave_session", "msg=\"os random source failed\", error=\"{e}\"");
            SessionError::RandomnessUnavailable(e.to_string())
        })?;
        Ok(SessionId(self.config.encoding.encode(&buf)))
    }
}
