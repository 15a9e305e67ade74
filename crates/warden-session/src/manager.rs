//! Session actor: the one task allowed to change credentials.
//!
//! Bootstrap, login, logout and token renewal all arrive here as
//! commands and run one after another. The actor owns the credential
//! store and the write side of the [`HeaderInjector`], so store, header
//! and published state can never drift apart: whatever clears one
//! clears all three before the next command is looked at.
//!
//! ```text
//! SessionManager ──cmd──→ SessionActor ──→ CredentialStore
//!   (clone)      ←─reply─      │       ──→ HeaderInjector
//!                              ├──watch──→ SessionState subscribers
//!                              └─broadcast→ Notice subscribers
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use warden_protocol::{
    AccessClaims, Codec, CredentialPair, FieldErrors, Identity, JsonCodec,
    LoginRequest, RefreshRequest, RefreshResponse, TokenResponse, paths,
    server_message,
};
use warden_store::CredentialStore;
use warden_transport::{ApiRequest, HttpTransport};

use crate::{
    HeaderInjector, Notice, RemoteVerifier, SessionConfig, SessionError,
    SessionState, TokenVerifier,
};

const COMMAND_BUFFER: usize = 32;

pub const LOGIN_OK: &str = "Logged in successfully!";
pub const LOGOUT_OK: &str = "Logged out successfully.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Why a renewal produced no new access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenewError {
    /// No refresh credential is stored.
    Missing,
    /// The exchange failed and the session was signed out.
    Rejected(String),
    /// The session task is gone.
    Closed,
}

enum SessionCommand {
    Bootstrap {
        reply: oneshot::Sender<SessionState>,
    },
    Login {
        request: LoginRequest,
        reply: oneshot::Sender<Result<Identity, SessionError>>,
    },
    Logout {
        reply: oneshot::Sender<()>,
    },
    /// `stale` is the token the failing request was sent with.
    Renew {
        stale: Option<String>,
        reply: oneshot::Sender<Result<String, RenewError>>,
    },
}

/// Handle to the running session. Cheap to clone.
///
/// Every clone talks to the same actor, sees the same state and shares
/// the same [`HeaderInjector`].
#[derive(Clone)]
pub struct SessionManager {
    sender: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    notices: broadcast::Sender<Notice>,
    injector: HeaderInjector,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    /// Starts a session that verifies tokens against the server behind
    /// `transport`.
    ///
    /// Must be called from within a Tokio runtime. The session starts in
    /// [`SessionState::Checking`]; call [`bootstrap`](Self::bootstrap)
    /// to settle it.
    pub fn start<T, S>(transport: Arc<T>, store: S, config: SessionConfig) -> Self
    where
        T: HttpTransport,
        S: CredentialStore,
    {
        let verifier = RemoteVerifier::new(Arc::clone(&transport))
            .with_placeholder(config.placeholder_username.clone());
        Self::spawn(transport, store, verifier, config)
    }

    /// Starts a session with a custom [`TokenVerifier`].
    pub fn spawn<T, S, V>(
        transport: Arc<T>,
        store: S,
        verifier: V,
        config: SessionConfig,
    ) -> Self
    where
        T: HttpTransport,
        S: CredentialStore,
        V: TokenVerifier,
    {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SessionState::Checking);
        let (notices, _) = broadcast::channel(config.notice_capacity.max(1));
        let injector = HeaderInjector::new();
        let config = Arc::new(config);

        let actor = SessionActor {
            transport,
            store,
            verifier,
            codec: JsonCodec,
            injector: injector.clone(),
            state: state_tx,
            notices: notices.clone(),
            config: Arc::clone(&config),
            receiver,
        };
        tokio::spawn(actor.run());

        Self {
            sender,
            state: state_rx,
            notices,
            injector,
            config,
        }
    }

    /// The current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that is woken on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// A receiver for user-facing notices. Only notices sent after this
    /// call are delivered.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Publishes a notice to every notice subscriber.
    pub fn notify(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    /// Read access to the bearer token provider.
    pub fn injector(&self) -> &HeaderInjector {
        &self.injector
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Verifies the stored credential, if any, and settles the state.
    ///
    /// Always leaves [`SessionState::Checking`]: a valid credential
    /// yields `Authenticated`, anything else clears the store and
    /// yields `Anonymous`.
    pub async fn bootstrap(&self) -> Result<SessionState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Bootstrap { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Exchanges username (or email) and password for a credential pair.
    ///
    /// On failure the previous state is restored and nothing is stored.
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<Identity, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Login {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Clears the stored credential and the injected header.
    ///
    /// Idempotent. Fails only with `SessionError::Closed`.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Logout { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Waits until the session is no longer `Checking`.
    pub async fn ready(&self) -> Result<SessionState, SessionError> {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(|s| !s.is_checking())
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(settled.clone())
    }

    /// Asks the actor for a fresh access token.
    pub(crate) async fn renew(
        &self,
        stale: Option<String>,
    ) -> Result<String, RenewError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Renew {
                stale,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RenewError::Closed)?;
        reply_rx.await.map_err(|_| RenewError::Closed)?
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

struct SessionActor<T, S, V> {
    transport: Arc<T>,
    store: S,
    verifier: V,
    codec: JsonCodec,
    injector: HeaderInjector,
    state: watch::Sender<SessionState>,
    notices: broadcast::Sender<Notice>,
    config: Arc<SessionConfig>,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl<T, S, V> SessionActor<T, S, V>
where
    T: HttpTransport,
    S: CredentialStore,
    V: TokenVerifier,
{
    async fn run(mut self) {
        tracing::debug!("session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Bootstrap { reply } => {
                    let state = self.handle_bootstrap().await;
                    let _ = reply.send(state);
                }
                SessionCommand::Login { request, reply } => {
                    let result = self.handle_login(request).await;
                    let _ = reply.send(result);
                }
                SessionCommand::Logout { reply } => {
                    self.handle_logout().await;
                    let _ = reply.send(());
                }
                SessionCommand::Renew { stale, reply } => {
                    let result = self.handle_renew(stale).await;
                    let _ = reply.send(result);
                }
            }
        }

        tracing::debug!("session actor stopped");
    }

    // -- Bootstrap ----------------------------------------------------------

    async fn handle_bootstrap(&mut self) -> SessionState {
        self.publish(SessionState::Checking);

        let Some(pair) = self.load_pair().await else {
            self.clear_credentials().await;
            self.publish(SessionState::Anonymous);
            return SessionState::Anonymous;
        };

        match self.verifier.verify(&pair.access).await {
            Ok(identity) => {
                self.injector.set(Some(pair.access));
                let state = SessionState::Authenticated(identity);
                self.publish(state.clone());
                state
            }
            Err(e) => {
                tracing::info!(error = %e, "stored credentials rejected");
                self.clear_credentials().await;
                self.publish(SessionState::Anonymous);
                SessionState::Anonymous
            }
        }
    }

    // -- Login --------------------------------------------------------------

    async fn handle_login(
        &mut self,
        request: LoginRequest,
    ) -> Result<Identity, SessionError> {
        if let Err(errors) = request.validate() {
            let err = SessionError::Validation(errors);
            self.notify(Notice::error(format!("Login failed: {err}")));
            return Err(err);
        }

        let previous = self.state.borrow().clone();
        self.publish(SessionState::Checking);

        match self.exchange_login(&request).await {
            Ok(identity) => {
                tracing::info!(username = %identity.username, "logged in");
                self.publish(SessionState::Authenticated(identity.clone()));
                self.notify(Notice::success(LOGIN_OK));
                Ok(identity)
            }
            Err(e) => {
                tracing::info!(
                    username = %request.username,
                    error = %e,
                    "login failed"
                );
                if previous.is_checking() {
                    // No settled state to return to.
                    self.clear_credentials().await;
                    self.publish(SessionState::Anonymous);
                } else {
                    self.publish(previous);
                }
                self.notify(Notice::error(format!("Login failed: {e}")));
                Err(e)
            }
        }
    }

    async fn exchange_login(
        &self,
        request: &LoginRequest,
    ) -> Result<Identity, SessionError> {
        let body = self.codec.encode(request)?;
        let http = ApiRequest::post(paths::TOKEN)
            .with_body(self.codec.content_type(), body);

        let response = self.transport.send(&http).await?;
        if !response.is_success() {
            let status = response.status();
            if status == 400 {
                if let Some(errors) = FieldErrors::from_body(response.body()) {
                    return Err(SessionError::Validation(errors));
                }
            }
            let mut message = server_message(response.body());
            if message.is_empty() {
                message = format!("login rejected with status {status}");
            }
            return Err(SessionError::LoginRejected { status, message });
        }

        let tokens: TokenResponse = self.codec.decode(response.body())?;
        let pair = tokens.pair();
        self.store.save(&pair).await?;
        self.injector.set(Some(pair.access.clone()));

        Ok(self.login_identity(&tokens).await)
    }

    /// User endpoint first, then the username the token endpoint echoed,
    /// then the token's own claims.
    async fn login_identity(&self, tokens: &TokenResponse) -> Identity {
        if let Some(identity) = self.verifier.user_details(&tokens.access).await {
            return identity;
        }

        let claims = AccessClaims::decode(&tokens.access).ok();
        if let Some(username) = &tokens.username {
            return Identity {
                id: claims.as_ref().and_then(|c| c.user_id),
                username: username.clone(),
                email: claims.as_ref().and_then(|c| c.email.clone()),
                placeholder: false,
            };
        }
        if let Some(identity) = claims.and_then(|c| c.identity()) {
            return identity;
        }

        tracing::warn!(
            error = %SessionError::UnknownIdentity,
            "continuing with placeholder identity"
        );
        Identity::placeholder(self.config.placeholder_username.clone())
    }

    // -- Logout -------------------------------------------------------------

    async fn handle_logout(&mut self) {
        let was_authenticated = self.state.borrow().is_authenticated();
        self.clear_credentials().await;
        self.publish(SessionState::Anonymous);
        if was_authenticated {
            tracing::info!("logged out");
            self.notify(Notice::info(LOGOUT_OK));
        }
    }

    // -- Renewal ------------------------------------------------------------

    async fn handle_renew(
        &mut self,
        stale: Option<String>,
    ) -> Result<String, RenewError> {
        if self.config.coalesce_renewals {
            if let Some(current) = self.injector.current() {
                if stale.as_deref() != Some(current.as_str()) {
                    tracing::debug!("token already renewed, reusing it");
                    return Ok(current);
                }
            }
        }

        let Some(pair) = self.load_pair().await else {
            if self.state.borrow().is_authenticated() {
                // The header outlived the stored pair.
                tracing::info!("stored credentials gone, signing out");
                self.expire_session().await;
            }
            return Err(RenewError::Missing);
        };

        match self.exchange_refresh(&pair).await {
            Ok(renewed) => {
                tracing::info!("access token renewed");
                let access = renewed.access.clone();
                self.injector.set(Some(renewed.access));
                Ok(access)
            }
            Err(reason) => {
                tracing::info!(reason = %reason, "renewal failed, signing out");
                self.expire_session().await;
                Err(RenewError::Rejected(reason))
            }
        }
    }

    /// Trades the refresh credential for a new access credential and
    /// persists the resulting pair.
    async fn exchange_refresh(
        &self,
        pair: &CredentialPair,
    ) -> Result<CredentialPair, String> {
        let body = self
            .codec
            .encode(&RefreshRequest {
                refresh: pair.refresh.clone(),
            })
            .map_err(|e| e.to_string())?;
        let http = ApiRequest::post(paths::TOKEN_REFRESH)
            .with_body(self.codec.content_type(), body);

        let response = self
            .transport
            .send(&http)
            .await
            .map_err(|e| format!("network error: {e}"))?;
        if !response.is_success() {
            return Err(format!(
                "refresh rejected with status {}",
                response.status()
            ));
        }

        let refreshed: RefreshResponse = self
            .codec
            .decode(response.body())
            .map_err(|e| e.to_string())?;
        let renewed = pair.renewed(refreshed.access, refreshed.refresh);
        self.store.save(&renewed).await.map_err(|e| e.to_string())?;
        Ok(renewed)
    }

    // -- Helpers ------------------------------------------------------------

    /// Loads the stored pair. Unreadable or revoked credentials count
    /// as none.
    async fn load_pair(&self) -> Option<CredentialPair> {
        match self.store.load().await {
            Ok(pair) => pair.filter(|pair| !pair.is_revoked()),
            Err(e) => {
                tracing::warn!(error = %e, "stored credentials unreadable");
                None
            }
        }
    }

    /// Removes the stored pair, or overwrites it with a revoked one if it
    /// can't be removed, then drops the header.
    async fn clear_credentials(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "failed to clear stored credentials");
            if let Err(e) = self.store.save(&CredentialPair::revoked()).await {
                tracing::error!(
                    error = %e,
                    "failed to revoke stored credentials"
                );
            }
        }
        self.injector.set(None);
    }

    async fn expire_session(&self) {
        self.clear_credentials().await;
        self.publish(SessionState::Anonymous);
        self.notify(Notice::warning(SESSION_EXPIRED));
    }

    fn publish(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::info!(from = %current, to = %next, "session state changed");
            *current = next;
            true
        });
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_store::MemoryCredentialStore;
    use warden_transport::{ApiResponse, TransportError};

    /// Accepts `secret` for alice and every token it issued.
    struct TokenServer;

    impl HttpTransport for TokenServer {
        async fn send(
            &self,
            request: &ApiRequest,
        ) -> Result<ApiResponse, TransportError> {
            let body = request.body().unwrap_or_default();
            let response = match request.path() {
                paths::TOKEN if body.windows(6).any(|w| w == b"secret") => {
                    ApiResponse::new(
                        200,
                        br#"{"access":"a1","refresh":"r1","username":"alice"}"#
                            .to_vec(),
                    )
                }
                paths::TOKEN => ApiResponse::new(
                    401,
                    br#"{"detail":"No active account found"}"#.to_vec(),
                ),
                paths::TOKEN_VERIFY if body.windows(2).any(|w| w == b"a1") => {
                    ApiResponse::new(200, b"{}".to_vec())
                }
                paths::TOKEN_REFRESH => {
                    ApiResponse::new(200, br#"{"access":"a2"}"#.to_vec())
                }
                _ => ApiResponse::new(401, Vec::new()),
            };
            Ok(response)
        }
    }

    fn manager(store: MemoryCredentialStore) -> SessionManager {
        SessionManager::start(Arc::new(TokenServer), store, SessionConfig::default())
    }

    #[tokio::test]
    async fn test_bootstrap_empty_store_yields_anonymous() {
        let session = manager(MemoryCredentialStore::new());
        assert!(session.state().is_checking());

        let state = session.bootstrap().await.expect("bootstrap");

        assert_eq!(state, SessionState::Anonymous);
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_uses_echoed_username_when_user_lookup_fails() {
        let store = MemoryCredentialStore::new();
        let session = manager(store.clone());
        session.bootstrap().await.expect("bootstrap");

        let identity = session
            .login(LoginRequest::new("alice", "secret"))
            .await
            .expect("login");

        assert_eq!(identity.username, "alice");
        assert_eq!(session.injector().current().as_deref(), Some("a1"));
        assert_eq!(store.snapshot().await.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_login_invalid_form_sends_nothing() {
        let session = manager(MemoryCredentialStore::new());
        session.bootstrap().await.expect("bootstrap");

        let result = session.login(LoginRequest::new("", "")).await;

        let Err(SessionError::Validation(errors)) = result else {
            panic!("expected validation error, got {result:?}");
        };
        assert_eq!(errors.first("username"), Some("Username or email is required"));
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_renew_without_refresh_credential_is_missing() {
        let session = manager(MemoryCredentialStore::new());
        session.bootstrap().await.expect("bootstrap");

        assert_eq!(session.renew(None).await, Err(RenewError::Missing));
    }

    #[tokio::test]
    async fn test_renew_with_stale_token_reuses_current_when_coalescing() {
        let session = manager(MemoryCredentialStore::new());
        session.bootstrap().await.expect("bootstrap");
        session
            .login(LoginRequest::new("alice", "secret"))
            .await
            .expect("login");

        let renewed = session.renew(Some("a0".into())).await;

        assert_eq!(renewed.as_deref(), Ok("a1"));
    }

    #[tokio::test]
    async fn test_renew_current_token_exchanges_refresh() {
        let store = MemoryCredentialStore::new();
        let session = manager(store.clone());
        session.bootstrap().await.expect("bootstrap");
        session
            .login(LoginRequest::new("alice", "secret"))
            .await
            .expect("login");

        let renewed = session.renew(Some("a1".into())).await;

        assert_eq!(renewed.as_deref(), Ok("a2"));
        let entries = store.snapshot().await;
        assert_eq!(entries.access_token.as_deref(), Some("a2"));
        assert_eq!(entries.refresh_token.as_deref(), Some("r1"));
    }
}
