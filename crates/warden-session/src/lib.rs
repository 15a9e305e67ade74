//! Client session lifecycle for Warden.
//!
//! This crate turns a transport and a credential store into a session:
//!
//! - **[`SessionManager`]** runs the session actor. It bootstraps from
//!   stored credentials, logs in and out, renews the access token, and
//!   publishes [`SessionState`] changes and [`Notice`]s.
//! - **[`HeaderInjector`]** carries the one active access token.
//! - **[`AuthorizedClient`]** sends ordinary API calls with the bearer
//!   header and replays a request once after renewing on 401.
//! - **[`TokenVerifier`]** checks a token with the issuing server.
//! - **[`SessionGate`]** decides whether protected content may render.
//!
//! ```text
//!                      ┌───────────────────────┐
//!   AuthorizedClient ──┤ HeaderInjector (read) │
//!        │ 401         └───────────▲───────────┘
//!        ▼                         │ set
//!   SessionManager ──cmd──→ SessionActor ──→ CredentialStore
//!        │                         └───────→ HttpTransport
//!        └── watch<SessionState> ──→ SessionGate
//! ```

mod client;
mod error;
mod gate;
mod injector;
mod manager;
mod session;
mod verifier;

pub use client::{Attempt, AuthorizedClient, rejection};
pub use error::SessionError;
pub use gate::{GateDecision, LOGIN_REQUIRED, Redirect, SessionGate};
pub use injector::{AUTHORIZATION, HeaderInjector};
pub use manager::{LOGIN_OK, LOGOUT_OK, SESSION_EXPIRED, SessionManager};
pub use session::{Notice, SessionConfig, SessionState, Severity};
pub use verifier::{RemoteVerifier, TokenVerifier};
