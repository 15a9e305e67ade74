//! # Warden
//!
//! Client-side session and token lifecycle for HTTP APIs that issue
//! short-lived access tokens with longer-lived refresh tokens.
//!
//! Warden keeps the credential pair on disk, stamps the access token on
//! every request, renews it once when the server answers 401, and
//! publishes whether anyone is logged in so protected views can gate on
//! it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! # async fn run() -> Result<(), WardenError> {
//! warden::init_logging();
//! let client = WardenClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .build()?;
//!
//! if !client.bootstrap().await?.is_authenticated() {
//!     client.login("alice", "secret").await?;
//! }
//! let history: serde_json::Value = client.get_json("/history/").await?;
//! # let _ = history;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod logging;
mod registration;

pub use client::{WardenClient, WardenClientBuilder};
pub use config::{ClientConfig, ENV_API_URL, ENV_CREDENTIALS_PATH, ENV_TIMEOUT_SECS};
pub use error::WardenError;
pub use logging::{DEFAULT_FILTER, init_logging};
pub use registration::REGISTER_OK;

pub use warden_protocol as protocol;
pub use warden_session as session;
pub use warden_store as store;
pub use warden_transport as transport;

pub mod prelude {
    pub use crate::{ClientConfig, WardenClient, WardenClientBuilder, WardenError};
    pub use warden_protocol::{FieldErrors, Identity, LoginRequest, RegisterRequest};
    pub use warden_session::{
        GateDecision, Notice, Redirect, SessionConfig, SessionError, SessionGate,
        SessionState, Severity,
    };
}
