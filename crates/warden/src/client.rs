//! `WardenClient` builder and handle.
//!
//! This is the entry point for applications. It ties the layers
//! together: transport → store → session → authorized client.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use warden_protocol::{Identity, LoginRequest, RegisterRequest};
use warden_session::{
    AuthorizedClient, Notice, Redirect, SessionConfig, SessionGate,
    SessionManager, SessionState,
};
use warden_store::{CredentialStore, FileCredentialStore};
use warden_transport::{HttpTransport, ReqwestTransport};
use tokio::sync::{broadcast, watch};

use crate::{ClientConfig, WardenError, registration};

/// Builder for configuring a [`WardenClient`].
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), warden::WardenError> {
/// let client = warden::WardenClient::builder()
///     .api_base_url("http://localhost:8000/api")
///     .build()?;
/// client.bootstrap().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WardenClientBuilder {
    config: ClientConfig,
}

impl WardenClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. one read from the
    /// environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn credentials_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.credentials_path = Some(path.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Builds a client over HTTP with credentials in a file.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `WardenError::Transport` if the base URL is unusable.
    /// - `WardenError::Store` if no credentials path was configured and
    ///   the platform has no data directory.
    pub fn build(self) -> Result<WardenClient<ReqwestTransport>, WardenError> {
        let transport = ReqwestTransport::new(
            &self.config.api_base_url,
            self.config.request_timeout,
        )?;
        let store = match &self.config.credentials_path {
            Some(path) => FileCredentialStore::new(path),
            None => FileCredentialStore::at_default_path()?,
        };
        tracing::debug!(
            api_base_url = %transport.base_url(),
            credentials = %store.path().display(),
            "building client"
        );
        Ok(self.build_with(transport, store))
    }

    /// Builds a client over any transport and store.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build_with<T, S>(self, transport: T, store: S) -> WardenClient<T>
    where
        T: HttpTransport,
        S: CredentialStore,
    {
        let transport = Arc::new(transport);
        let gate = SessionGate::new(self.config.session.login_path.clone());
        let session =
            SessionManager::start(Arc::clone(&transport), store, self.config.session);
        let http = AuthorizedClient::new(transport, session.clone());
        WardenClient {
            session,
            http,
            gate,
        }
    }
}

/// A client session against one API.
///
/// Cheap to clone; clones share the same session.
pub struct WardenClient<T> {
    session: SessionManager,
    http: AuthorizedClient<T>,
    gate: SessionGate,
}

impl<T> Clone for WardenClient<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            http: self.http.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl WardenClient<ReqwestTransport> {
    /// Creates a new builder.
    pub fn builder() -> WardenClientBuilder {
        WardenClientBuilder::new()
    }
}

impl<T: HttpTransport> WardenClient<T> {
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The pipeline for ordinary API calls.
    pub fn http(&self) -> &AuthorizedClient<T> {
        &self.http
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.session.notices()
    }

    /// Settles the session from stored credentials.
    pub async fn bootstrap(&self) -> Result<SessionState, WardenError> {
        Ok(self.session.bootstrap().await?)
    }

    /// Logs in with a username or email address.
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Identity, WardenError> {
        let request = LoginRequest::new(username, password);
        Ok(self.session.login(request).await?)
    }

    pub async fn logout(&self) -> Result<(), WardenError> {
        Ok(self.session.logout().await?)
    }

    /// Creates an account. Does not log in.
    ///
    /// # Errors
    /// `SessionError::Validation` (wrapped) with per-field messages when
    /// the form fails the local checks or the server rejects it.
    pub async fn register(&self, form: &RegisterRequest) -> Result<(), WardenError> {
        Ok(registration::register(&self.http, form).await?)
    }

    /// Waits for the session to settle and applies the gate.
    pub async fn admit(&self) -> Result<Result<Identity, Redirect>, WardenError> {
        Ok(self.gate.admit(&self.session).await?)
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, WardenError> {
        Ok(self.http.get_json(path).await?)
    }

    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, WardenError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        Ok(self.http.post_json(path, body).await?)
    }
}
