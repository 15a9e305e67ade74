//! Unified error type for Warden.

use warden_protocol::ProtocolError;
use warden_session::SessionError;
use warden_store::StoreError;
use warden_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` variants let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Login, renewal, validation and rejected calls.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client configuration could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WardenError {
    /// The session-layer error, if this is one.
    pub fn as_session(&self) -> Option<&SessionError> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::InvalidUrl("ftp://x".into());
        let warden_err: WardenError = err.into();
        assert!(matches!(warden_err, WardenError::Transport(_)));
        assert!(warden_err.to_string().contains("ftp://x"));
    }

    #[test]
    fn test_from_store_error() {
        let warden_err: WardenError = StoreError::NoDataDir.into();
        assert!(matches!(warden_err, WardenError::Store(_)));
    }

    #[test]
    fn test_from_session_error() {
        let warden_err: WardenError = SessionError::Closed.into();
        assert!(matches!(
            warden_err.as_session(),
            Some(SessionError::Closed)
        ));
    }

    #[test]
    fn test_config_error_display() {
        let err = WardenError::Config("WARDEN_TIMEOUT_SECS is not a number".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: WARDEN_TIMEOUT_SECS is not a number"
        );
    }
}
