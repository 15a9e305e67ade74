//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use warden_session::SessionConfig;

use crate::WardenError;

pub const ENV_API_URL: &str = "WARDEN_API_URL";
pub const ENV_CREDENTIALS_PATH: &str = "WARDEN_CREDENTIALS_PATH";
pub const ENV_TIMEOUT_SECS: &str = "WARDEN_TIMEOUT_SECS";

/// Where the API lives, where credentials are kept and how long a
/// request may take.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is appended to.
    ///
    /// Default: `http://localhost:8000/api`.
    pub api_base_url: String,

    /// Credential file location. `None` uses the platform data
    /// directory.
    pub credentials_path: Option<PathBuf>,

    /// Per-request timeout. Default: 30 seconds.
    pub request_timeout: Duration,

    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            credentials_path: None,
            request_timeout: Duration::from_secs(30),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `WARDEN_API_URL`, `WARDEN_CREDENTIALS_PATH`
    /// and `WARDEN_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// `WardenError::Config` if the timeout is not a whole number of
    /// seconds.
    pub fn from_env() -> Result<Self, WardenError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, WardenError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_PATH).filter(|v| !v.is_empty()) {
            config.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                WardenError::Config(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
