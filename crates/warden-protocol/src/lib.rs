//! Wire protocol for Warden.
//!
//! This crate defines what the client and the token server exchange:
//!
//! - **Types** ([`CredentialPair`], [`Identity`], [`LoginRequest`],
//!   [`TokenResponse`], etc.): request and response bodies.
//! - **Claims** ([`AccessClaims`]): the identity and expiry embedded in
//!   an access token.
//! - **Forms** ([`FieldErrors`]): field-level validation messages, both
//!   server-reported and client pre-checks.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies become bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (typed bodies) → Session (credentials, state)
//! ```

mod claims;
mod codec;
mod error;
mod forms;
mod types;

pub use claims::AccessClaims;
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use forms::{FieldErrors, MIN_PASSWORD_LEN, NON_FIELD_ERRORS, server_message};
pub use types::{
    CredentialPair, Identity, LoginRequest, RefreshRequest, RefreshResponse,
    RegisterRequest, TokenResponse, VerifyRequest,
};

/// Server paths, relative to the API base URL.
pub mod paths {
    pub const REGISTER: &str = "/register/";
    pub const TOKEN: &str = "/token/";
    pub const TOKEN_VERIFY: &str = "/token/verify/";
    pub const TOKEN_REFRESH: &str = "/token/refresh/";
    pub const USER: &str = "/user/";
}
