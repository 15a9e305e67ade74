//! Wire types: the values exchanged with the token endpoints.
//!
//! Anything holding a secret (tokens, passwords) has a hand-written
//! `Debug` impl that redacts it, so these types can be passed to
//! `tracing` fields without leaking credentials into logs.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The access/refresh credentials of one client session.
///
/// Created by a login or a renewal and always stored as a whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived bearer token (a JWT with an embedded expiry).
    pub access: String,
    /// Longer-lived token that can only buy a new access token.
    pub refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Returns a pair with the access token replaced and the refresh
    /// token kept, unless the server rotated it.
    pub fn renewed(&self, access: String, rotated: Option<String>) -> Self {
        Self {
            access,
            refresh: rotated.unwrap_or_else(|| self.refresh.clone()),
        }
    }

    /// A pair with both tokens empty. Written over stored credentials
    /// that could not be removed; loads back as no credentials at all.
    pub fn revoked() -> Self {
        Self::new("", "")
    }

    /// `true` if either token is empty.
    pub fn is_revoked(&self) -> bool {
        self.access.is_empty() || self.refresh.is_empty()
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The minimal user record behind a validated credential.
///
/// Never persisted: recomputed every time a credential is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-side user ID. `None` for a placeholder identity.
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Set only by [`Identity::placeholder`]; never on the wire.
    #[serde(skip)]
    pub placeholder: bool,
}

impl Identity {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            username: username.into(),
            email: None,
            placeholder: false,
        }
    }

    /// Stand-in identity for a session whose credential verified but
    /// whose user record could not be resolved.
    pub fn placeholder(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: None,
            placeholder: true,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /token/`. `username` may also be an email address.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /register/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Password confirmation; the server re-checks that it matches.
    pub password2: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /token/verify/`.
#[derive(Serialize, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Body of `POST /token/refresh/`.
#[derive(Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of `POST /token/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    /// Added by servers that echo the account name next to the tokens.
    #[serde(default)]
    pub username: Option<String>,
}

impl TokenResponse {
    pub fn pair(&self) -> CredentialPair {
        CredentialPair::new(self.access.clone(), self.refresh.clone())
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Response of `POST /token/refresh/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Present only when the server rotates refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

impl fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshResponse")
            .field("rotated", &self.refresh.is_some())
            .finish_non_exhaustive()
    }
}
