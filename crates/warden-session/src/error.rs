//! Error types for the session layer.

use warden_protocol::{FieldErrors, ProtocolError};
use warden_store::StoreError;
use warden_transport::{ApiResponse, TransportError};

/// Errors that can occur while acquiring, using or renewing a session.
///
/// Every variant leaves the store, the header injector and the session
/// state consistent with each other. Only [`AuthorizationInvalid`]
/// (renewal failed) and a failed stored-credential check end the
/// session; everything else leaves it as it was.
///
/// [`AuthorizationInvalid`]: SessionError::AuthorizationInvalid
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request body was rejected field by field. Recoverable by
    /// correcting the input; never clears the session.
    #[error("{0}")]
    Validation(FieldErrors),

    /// The server answered 401 and no renewal was possible: either no
    /// refresh credential is stored or this request already used its
    /// single retry. Carries the original response.
    #[error("authorization expired (status {})", .response.status())]
    AuthorizationExpired { response: ApiResponse },

    /// Renewing the access token failed. The session has been signed
    /// out; carries the original 401 response.
    #[error("session ended, renewal failed: {reason}")]
    AuthorizationInvalid { response: ApiResponse, reason: String },

    /// The issuing server did not confirm the access token.
    #[error("access token rejected by server (status {status})")]
    TokenInvalid { status: u16 },

    /// The login exchange refused the credentials.
    #[error("{message}")]
    LoginRejected { status: u16, message: String },

    /// A call returned a non-success status the caller has to handle.
    #[error("request failed with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The token verified but no user record could be resolved.
    ///
    /// Non-fatal: the session continues with a placeholder identity.
    #[error("identity could not be resolved")]
    UnknownIdentity,

    /// No usable response arrived. The session is unchanged.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session task has shut down.
    #[error("session service is not running")]
    Closed,
}

impl SessionError {
    /// `true` for errors after which the session is no longer
    /// authenticated.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationInvalid { .. } | Self::TokenInvalid { .. }
        )
    }

    /// The HTTP status behind this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthorizationExpired { response }
            | Self::AuthorizationInvalid { response, .. } => {
                Some(response.status())
            }
            Self::TokenInvalid { status }
            | Self::LoginRejected { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            Self::Validation(_) => Some(400),
            _ => None,
        }
    }
}
