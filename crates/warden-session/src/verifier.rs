//! Token verification and identity lookup.
//!
//! The client can read the claims of an access token but cannot check
//! its signature. Only the issuing server can say whether a token is
//! still good, so verification is always a round trip. The
//! [`TokenVerifier`] trait is the seam: [`RemoteVerifier`] talks to the
//! real endpoints, tests can plug in anything else.

use std::future::Future;
use std::sync::Arc;

use warden_protocol::{AccessClaims, Codec, Identity, JsonCodec, VerifyRequest, paths};
use warden_transport::{ApiRequest, HttpTransport};

use crate::SessionError;
use crate::injector::authorize;

/// Checks access tokens with the issuing server.
pub trait TokenVerifier: Send + Sync + 'static {
    /// Confirms the token and returns the identity it belongs to.
    ///
    /// # Errors
    /// - `SessionError::TokenInvalid` if the server rejected the token.
    /// - `SessionError::Network` if the server could not be reached.
    ///
    /// Either way the token must not be kept.
    fn verify(
        &self,
        access: &str,
    ) -> impl Future<Output = Result<Identity, SessionError>> + Send;

    /// Fetches the user record for the given bearer token.
    ///
    /// Returns `None` instead of failing.
    fn user_details(
        &self,
        access: &str,
    ) -> impl Future<Output = Option<Identity>> + Send;
}

/// Verifies tokens against `POST /token/verify/` and `GET /user/`.
pub struct RemoteVerifier<T> {
    transport: Arc<T>,
    codec: JsonCodec,
    placeholder_username: String,
}

impl<T: HttpTransport> RemoteVerifier<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            codec: JsonCodec,
            placeholder_username: "User".to_string(),
        }
    }

    /// Username given to the identity of a token that verified but
    /// whose user could not be looked up.
    pub fn with_placeholder(mut self, username: impl Into<String>) -> Self {
        self.placeholder_username = username.into();
        self
    }
}

impl<T: HttpTransport> TokenVerifier for RemoteVerifier<T> {
    async fn verify(&self, access: &str) -> Result<Identity, SessionError> {
        let body = self.codec.encode(&VerifyRequest {
            token: access.to_string(),
        })?;
        let request = ApiRequest::post(paths::TOKEN_VERIFY)
            .with_body(self.codec.content_type(), body);

        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            tracing::debug!(
                request_id = %request.id(),
                status = response.status(),
                "token verification rejected"
            );
            return Err(SessionError::TokenInvalid {
                status: response.status(),
            });
        }

        let from_claims = match AccessClaims::decode(access) {
            Ok(claims) => claims.identity(),
            Err(e) => {
                tracing::debug!(error = %e, "access token claims unreadable");
                None
            }
        };
        if let Some(identity) = from_claims {
            return Ok(identity);
        }

        if let Some(identity) = self.user_details(access).await {
            return Ok(identity);
        }

        tracing::warn!(
            error = %SessionError::UnknownIdentity,
            username = %self.placeholder_username,
            "continuing with placeholder identity"
        );
        Ok(Identity::placeholder(self.placeholder_username.clone()))
    }

    async fn user_details(&self, access: &str) -> Option<Identity> {
        let mut request = ApiRequest::get(paths::USER);
        authorize(&mut request, Some(access));

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "user lookup failed");
                return None;
            }
        };
        if !response.is_success() {
            tracing::debug!(
                request_id = %request.id(),
                status = response.status(),
                "user lookup rejected"
            );
            return None;
        }

        match self.codec.decode::<Identity>(response.body()) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "user record unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::AUTHORIZATION;
    use warden_transport::{ApiResponse, TransportError};

    /// Answers every request with whatever the closure returns.
    struct FnTransport<F>(F);

    impl<F> HttpTransport for FnTransport<F>
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        async fn send(
            &self,
            request: &ApiRequest,
        ) -> Result<ApiResponse, TransportError> {
            Ok((self.0)(request))
        }
    }

    fn verifier<F>(f: F) -> RemoteVerifier<FnTransport<F>>
    where
        F: Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    {
        RemoteVerifier::new(Arc::new(FnTransport(f)))
    }

    fn token(username: Option<&str>) -> String {
        AccessClaims {
            user_id: Some(7),
            username: username.map(str::to_string),
            email: None,
            exp: None,
        }
        .encode_unsigned()
        .expect("encode")
    }

    #[tokio::test]
    async fn test_verify_rejected_returns_token_invalid() {
        let verifier = verifier(|_| ApiResponse::new(401, Vec::new()));

        let result = verifier.verify(&token(Some("alice"))).await;

        assert!(matches!(
            result,
            Err(SessionError::TokenInvalid { status: 401 })
        ));
    }

    #[tokio::test]
    async fn test_verify_uses_claims_identity() {
        let verifier = verifier(|request| {
            assert_eq!(request.path(), paths::TOKEN_VERIFY);
            ApiResponse::new(200, b"{}".to_vec())
        });

        let identity = verifier.verify(&token(Some("alice"))).await.expect("verify");

        assert_eq!(identity, Identity::new(7, "alice"));
    }

    #[tokio::test]
    async fn test_verify_without_username_claim_falls_back_to_user_endpoint() {
        let verifier = verifier(|request| match request.path() {
            paths::USER => {
                assert!(request.header(AUTHORIZATION).is_some());
                ApiResponse::new(200, br#"{"id":9,"username":"bob"}"#.to_vec())
            }
            _ => ApiResponse::new(200, Vec::new()),
        });

        let identity = verifier.verify(&token(None)).await.expect("verify");

        assert_eq!(identity, Identity::new(9, "bob"));
    }

    #[tokio::test]
    async fn test_verify_without_any_identity_uses_placeholder() {
        let verifier = verifier(|request| match request.path() {
            paths::USER => ApiResponse::new(500, Vec::new()),
            _ => ApiResponse::new(200, Vec::new()),
        })
        .with_placeholder("Guest");

        let identity = verifier.verify(&token(None)).await.expect("verify");

        assert!(identity.is_placeholder());
        assert_eq!(identity.username, "Guest");
    }

    #[tokio::test]
    async fn test_user_details_unreadable_body_returns_none() {
        let verifier = verifier(|_| ApiResponse::new(200, b"<html>".to_vec()));

        assert_eq!(verifier.user_details("t").await, None);
    }
}
