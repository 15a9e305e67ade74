//! Codec trait and the JSON implementation used for request/response bodies.
//!
//! The session layer never calls `serde_json` directly; it goes through a
//! [`Codec`] so that bodies are encoded in exactly one place together with
//! the content type they are sent under.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes request bodies and decodes response bodies.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` value for bodies produced by [`encode`](Self::encode).
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use warden_protocol::{Codec, JsonCodec, RefreshRequest};
///
/// let codec = JsonCodec;
/// let bytes = codec
///     .encode(&RefreshRequest { refresh: "r-1".into() })
///     .unwrap();
/// assert_eq!(bytes, br#"{"refresh":"r-1"}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenResponse;

    #[test]
    fn test_decode_token_response_without_username() {
        let codec = JsonCodec;
        let parsed: TokenResponse = codec
            .decode(br#"{"access":"a","refresh":"r"}"#)
            .expect("should decode");
        assert_eq!(parsed.access, "a");
        assert_eq!(parsed.refresh, "r");
        assert_eq!(parsed.username, None);
    }

    #[test]
    fn test_decode_html_body_is_decode_error() {
        let codec = JsonCodec;
        let result: Result<TokenResponse, _> =
            codec.decode(b"<html>Bad Gateway</html>");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
