//! File-backed credential store.

use std::path::{Path, PathBuf};

use warden_protocol::CredentialPair;

use crate::{CredentialStore, StoreError, StoredEntries};

/// Stores credentials as a JSON document at a fixed path.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves either the old pair or the new one, never a
/// mix. On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at [`default_path`](Self::default_path).
    pub fn at_default_path() -> Result<Self, StoreError> {
        Self::default_path().map(Self::new).ok_or(StoreError::NoDataDir)
    }

    /// `<local data dir>/warden/credentials.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join("warden").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw entries, including a lone half of a pair.
    pub async fn entries(&self) -> Result<StoredEntries, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredEntries::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn write_atomically(&self, payload: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(
                &temp_path,
                std::fs::Permissions::from_mode(0o600),
            )
            .await
            .map_err(|e| self.io_error(e))?;
        }

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

impl CredentialStore for FileCredentialStore {
    async fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(&StoredEntries::from(pair))
            .map_err(StoreError::Encode)?;
        self.write_atomically(&payload).await?;
        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let entries = self.entries().await?;
        if entries.pair().is_none() && !entries.is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                "credential file holds only one entry; treating as logged out"
            );
        }
        Ok(entries.pair())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(
                    path = %self.path.display(),
                    "credentials cleared"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
