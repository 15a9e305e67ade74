//! Durable credential storage for Warden.
//!
//! The store persists exactly two named entries, `access_token` and
//! `refresh_token`. It performs no validation of its own. Interpreting
//! the tokens is the session layer's job.
//!
//! Two implementations ship with the crate:
//!
//! - [`FileCredentialStore`]: a small JSON document under the user's
//!   local data directory, replaced atomically on every save.
//! - [`MemoryCredentialStore`]: process-local, for tests and clients
//!   that should forget everything on exit.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use std::future::Future;

use serde::{Deserialize, Serialize};
use warden_protocol::CredentialPair;

/// Entry name of the stored access token.
pub const ACCESS_KEY: &str = "access_token";
/// Entry name of the stored refresh token.
pub const REFRESH_KEY: &str = "refresh_token";

/// Persists the credential pair of the current client session.
///
/// # Contract
///
/// - `save` replaces both entries.
/// - `load` returns `None` unless *both* entries are present and
///   non-empty; a lone entry is a logged-out state, not half a session.
/// - `clear` removes both entries and is a no-op when nothing is stored.
pub trait CredentialStore: Send + Sync + 'static {
    fn save(
        &self,
        pair: &CredentialPair,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<CredentialPair>, StoreError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The two named entries as they sit in storage.
///
/// Either may be missing (for instance after a crash between writes in an
/// older format, or a hand-edited file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredEntries {
    /// Returns the pair only if both entries are present and non-empty.
    pub fn pair(&self) -> Option<CredentialPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => {
                Some(CredentialPair::new(access.clone(), refresh.clone()))
                    .filter(|pair| !pair.is_revoked())
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<&CredentialPair> for StoredEntries {
    fn from(pair: &CredentialPair) -> Self {
        Self {
            access_token: Some(pair.access.clone()),
            refresh_token: Some(pair.refresh.clone()),
        }
    }
}
