//! Payload encoding between application types and stored bytes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::SessionError;

/// Turns session payloads into bytes for a [`SessionStore`](crate::SessionStore) and back.
///
/// Implementations must round-trip every value they accept.
pub trait PayloadCodec: Send + Sync {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SessionError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SessionError>;
}

/// JSON payloads via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SessionError> {
        serde_json::to_vec(value).map_err(|e| SessionError::Codec(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SessionError> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Codec(e.to_string()))
    }
}
