//! In-memory credential store.

use std::sync::Arc;

use tokio::sync::Mutex;
use warden_protocol::CredentialPair;

use crate::{CredentialStore, StoreError, StoredEntries};

/// Keeps credentials in process memory only.
///
/// Clones share the same entries, so a test can hand one clone to the
/// session layer and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<Mutex<StoredEntries>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds the given pair.
    pub fn with_pair(pair: &CredentialPair) -> Self {
        Self::with_entries(StoredEntries::from(pair))
    }

    /// A store seeded with arbitrary entries, including half a pair.
    pub fn with_entries(entries: StoredEntries) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Returns a copy of the raw entries.
    pub async fn snapshot(&self) -> StoredEntries {
        self.entries.lock().await.clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        *self.entries.lock().await = StoredEntries::from(pair);
        Ok(())
    }

    async fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        Ok(self.entries.lock().await.pair())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.entries.lock().await = StoredEntries::default();
        Ok(())
    }
}
