//! Error types for the protocol layer.
//!
//! A `ProtocolError` means a value could not cross the wire boundary:
//! a request body failed to serialize, a response body didn't match the
//! expected shape, or an access token isn't a readable JWT.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: an HTML error page where JSON was expected,
    /// missing required fields, or a truncated body.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The access token is not a three-segment JWT with a JSON payload.
    ///
    /// The token is never included in the message.
    #[error("malformed access token: {0}")]
    MalformedToken(String),
}
