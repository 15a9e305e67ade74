//! Access gate for protected views.

use warden_protocol::Identity;

use crate::{Notice, SessionError, SessionManager, SessionState};

pub const LOGIN_REQUIRED: &str = "You need to log in to view this page.";

/// What a protected view should do for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The session is still being checked. Show a neutral indicator.
    Wait,
    /// Nobody is logged in. Navigate to `to` and show `notice`.
    Redirect { to: String, notice: Notice },
    /// Render the protected content for this identity.
    Admit(Identity),
}

/// Decides whether protected content may render.
#[derive(Debug, Clone)]
pub struct SessionGate {
    login_path: String,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new("/login")
    }
}

impl SessionGate {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    /// Uses the login path from the session's configuration.
    pub fn for_session(session: &SessionManager) -> Self {
        Self::new(session.config().login_path.clone())
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Pure decision; sends nothing.
    pub fn decide(&self, state: &SessionState) -> GateDecision {
        match state {
            SessionState::Checking => GateDecision::Wait,
            SessionState::Anonymous => GateDecision::Redirect {
                to: self.login_path.clone(),
                notice: Notice::warning(LOGIN_REQUIRED),
            },
            SessionState::Authenticated(identity) => {
                GateDecision::Admit(identity.clone())
            }
        }
    }

    /// Waits for the session to settle, then decides.
    ///
    /// A redirect publishes its notice once, on the session's notice
    /// channel, and is returned as the error.
    pub async fn admit(
        &self,
        session: &SessionManager,
    ) -> Result<Result<Identity, Redirect>, SessionError> {
        let state = session.ready().await?;
        Ok(match self.decide(&state) {
            GateDecision::Admit(identity) => Ok(identity),
            GateDecision::Redirect { to, notice } => {
                session.notify(notice);
                Err(Redirect { to })
            }
            // `ready` never returns `Checking`.
            GateDecision::Wait => Err(Redirect {
                to: self.login_path.clone(),
            }),
        })
    }

    /// Renders `content` for the admitted identity, or returns the
    /// redirect.
    pub async fn guard<F, R>(
        &self,
        session: &SessionManager,
        content: F,
    ) -> Result<Result<R, Redirect>, SessionError>
    where
        F: FnOnce(&Identity) -> R,
    {
        Ok(self
            .admit(session)
            .await?
            .map(|identity| content(&identity)))
    }
}

/// Where an anonymous user was sent instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
}
