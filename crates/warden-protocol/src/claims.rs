//! Read-only view of the claims embedded in an access token.
//!
//! The client never validates signatures; the issuing server does that
//! at `/token/verify/`. Decoding here is only used to read the identity
//! and expiry the token carries.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::{Identity, ProtocolError};

/// Claims of an access token as issued by the token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl AccessClaims {
    /// Decodes the payload segment of a JWT without verifying it.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedToken`] if the token doesn't have three
    /// segments or its payload isn't base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self, ProtocolError> {
        let mut segments = token.split('.');
        let payload = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(ProtocolError::MalformedToken(
                    "expected three dot-separated segments".into(),
                ));
            }
        };

        // Some issuers pad their segments; RFC 7515 says they shouldn't.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ProtocolError::MalformedToken(e.to_string()))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| ProtocolError::MalformedToken(e.to_string()))
    }

    /// Encodes claims into an unsigned JWT (`alg: none`).
    ///
    /// Handy for tests and local tooling; servers won't accept these.
    pub fn encode_unsigned(&self) -> Result<String, ProtocolError> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = serde_json::to_vec(self).map_err(ProtocolError::Encode)?;
        Ok(format!("{header}.{}.", URL_SAFE_NO_PAD.encode(payload)))
    }

    /// Builds the identity these claims describe, if they name a user.
    pub fn identity(&self) -> Option<Identity> {
        let username = self.username.clone()?;
        Some(Identity {
            id: self.user_id,
            username,
            email: self.email.clone(),
            placeholder: false,
        })
    }
}
