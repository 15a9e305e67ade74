//! The bearer-token provider handed to the request pipeline.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use warden_transport::ApiRequest;

/// Header the access token is sent under.
pub const AUTHORIZATION: &str = "Authorization";

/// Holds the one active access token and stamps it onto requests.
///
/// Clones share the same slot. Only the session layer writes it; the
/// rest of the client can read the current token or decorate a request.
#[derive(Clone, Default)]
pub struct HeaderInjector {
    token: Arc<RwLock<Option<String>>>,
}

impl HeaderInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active token. `None` stops the header being sent.
    pub(crate) fn set(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = token;
    }

    /// The access token currently being injected.
    pub fn current(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Sets or removes the `Authorization` header from the active token.
    ///
    /// Returns the token that was applied so a caller can later tell
    /// whether a renewal has happened since.
    pub fn apply(&self, request: &mut ApiRequest) -> Option<String> {
        let token = self.current();
        authorize(request, token.as_deref());
        token
    }
}

impl fmt::Debug for HeaderInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderInjector")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Stamps `Authorization: Bearer <token>` onto a request, or strips the
/// header when there is no token.
pub fn authorize(request: &mut ApiRequest, token: Option<&str>) {
    match token {
        Some(token) => request.set_header(AUTHORIZATION, format!("Bearer {token}")),
        None => request.remove_header(AUTHORIZATION),
    }
}
