//! Session types: configuration, the session state, and user notices.

use std::fmt;

use warden_protocol::Identity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Answer a renewal request whose stale token has already been
    /// replaced with the current token instead of exchanging again.
    ///
    /// With this on, a burst of concurrent 401s costs one exchange.
    /// Turning it off makes every failing request renew on its own.
    ///
    /// Default: `true`.
    pub coalesce_renewals: bool,

    /// Where the gate sends anonymous users. Default: `/login`.
    pub login_path: String,

    /// Username of the placeholder identity used when a token verified
    /// but no user record could be resolved. Default: `User`.
    pub placeholder_username: String,

    /// How many unread notices a slow subscriber may lag behind before
    /// it starts missing them. Default: 16.
    pub notice_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            coalesce_renewals: true,
            login_path: "/login".to_string(),
            placeholder_username: "User".to_string(),
            notice_capacity: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the client session currently stands.
///
/// ```text
///            ┌──────────(login ok)──────────┐
///            │                              ▼
///  Checking ─┼─(bootstrap ok)──→ Authenticated(identity)
///      ▲     │                              │
///      │     └─(bootstrap fails)─→ Anonymous ◀─(logout / renewal fails)
///      └────────────(login starts)──────────┘
/// ```
///
/// - **Checking**: a stored credential is being verified, or a login
///   is in flight. Protected content must not render yet.
/// - **Authenticated**: a credential pair is stored and the injector
///   carries its access token.
/// - **Anonymous**: nothing is stored and no header is injected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Checking,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    pub fn is_checking(&self) -> bool {
        matches!(self, Self::Checking)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Authenticated(identity) => {
                write!(f, "Authenticated({})", identity.username)
            }
            Self::Anonymous => write!(f, "Anonymous"),
        }
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A short user-facing message about a session event, for a toast or
/// status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}
