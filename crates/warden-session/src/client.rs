//! The request pipeline for ordinary API calls.
//!
//! [`AuthorizedClient`] stamps the current bearer token on every request
//! and handles a 401 by renewing the access token once and replaying
//! the request with it. Each logical request is wrapped in an
//! [`Attempt`], which knows whether its one renewal has been spent.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use warden_protocol::{Codec, FieldErrors, JsonCodec, server_message};
use warden_transport::{ApiRequest, ApiResponse, HttpTransport, Method};

use crate::manager::RenewError;
use crate::{SessionError, SessionManager};

/// One logical request together with how many times it has been sent.
///
/// Immutable: moving on to the replay produces a new value, and a
/// replay has no further replay.
#[derive(Debug, Clone)]
pub struct Attempt {
    request: ApiRequest,
    number: u8,
}

impl Attempt {
    /// Attempts allowed per logical request: the original and one replay.
    pub const MAX: u8 = 2;

    pub fn first(request: ApiRequest) -> Self {
        Self { request, number: 1 }
    }

    /// The replay of this attempt, or `None` once the renewal is spent.
    pub fn retry(&self) -> Option<Self> {
        (self.number < Self::MAX).then(|| Self {
            request: self.request.clone(),
            number: self.number + 1,
        })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_retry(&self) -> bool {
        self.number > 1
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }
}

/// Sends requests with the session's bearer token and renews it on 401.
pub struct AuthorizedClient<T> {
    transport: Arc<T>,
    session: SessionManager,
    codec: JsonCodec,
}

impl<T> Clone for AuthorizedClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
            codec: self.codec,
        }
    }
}

impl<T: HttpTransport> AuthorizedClient<T> {
    pub fn new(transport: Arc<T>, session: SessionManager) -> Self {
        Self {
            transport,
            session,
            codec: JsonCodec,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Sends the request, renewing the access token at most once.
    ///
    /// Any response other than 401 is returned as-is, as is a transport
    /// error.
    ///
    /// # Errors
    /// - `SessionError::AuthorizationExpired` for a 401 with no stored
    ///   refresh credential, a 401 on the replay, or a session signed out
    ///   before the replay went out.
    /// - `SessionError::AuthorizationInvalid` when renewal failed; the
    ///   session has been signed out.
    /// - `SessionError::Network` when no response arrived.
    pub async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, SessionError> {
        let mut attempt = Attempt::first(request);
        let mut outgoing = attempt.request().clone();
        let mut sent_with = self.session.injector().apply(&mut outgoing);

        loop {
            let response = self.transport.send(&outgoing).await?;
            tracing::debug!(
                request_id = %outgoing.id(),
                attempt = attempt.number(),
                status = response.status(),
                "response received"
            );
            if !response.is_unauthorized() {
                return Ok(response);
            }

            let Some(next) = attempt.retry() else {
                return Err(SessionError::AuthorizationExpired { response });
            };

            match self.session.renew(sent_with.take()).await {
                Ok(_) => {}
                Err(RenewError::Missing) => {
                    return Err(SessionError::AuthorizationExpired { response });
                }
                Err(RenewError::Rejected(reason)) => {
                    return Err(SessionError::AuthorizationInvalid {
                        response,
                        reason,
                    });
                }
                Err(RenewError::Closed) => return Err(SessionError::Closed),
            }

            // The replay carries whatever is current now; a logout handled
            // after the renewal leaves nothing to send.
            attempt = next;
            outgoing = attempt.request().clone();
            sent_with = self.session.injector().apply(&mut outgoing);
            if sent_with.is_none() {
                return Err(SessionError::AuthorizationExpired { response });
            }
        }
    }

    /// `GET`s a path and decodes the JSON response.
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, SessionError> {
        let response = self.send(ApiRequest::get(path)).await?;
        self.decode_success(response)
    }

    /// `POST`s a JSON body and decodes the JSON response.
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, SessionError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send_json(Method::Post, path, body).await
    }

    /// Sends a JSON body with any method and decodes the JSON response.
    pub async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<R, SessionError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let bytes = self.codec.encode(body)?;
        let request = ApiRequest::new(method, path)
            .with_body(self.codec.content_type(), bytes);
        let response = self.send(request).await?;
        self.decode_success(response)
    }

    /// Maps a non-2xx response to an error and decodes a 2xx body.
    ///
    /// An empty 2xx body decodes as JSON `null`.
    fn decode_success<R: DeserializeOwned>(
        &self,
        response: ApiResponse,
    ) -> Result<R, SessionError> {
        if !response.is_success() {
            return Err(rejection(&response));
        }
        let body = match response.body() {
            [] => b"null".as_slice(),
            body => body,
        };
        Ok(self.codec.decode(body)?)
    }
}

/// Classifies a non-success response: field errors for a 400 that
/// carries them, otherwise the server's message.
pub fn rejection(response: &ApiResponse) -> SessionError {
    if response.status() == 400 {
        if let Some(errors) = FieldErrors::from_body(response.body()) {
            return SessionError::Validation(errors);
        }
    }
    SessionError::Rejected {
        status: response.status(),
        message: server_message(response.body()),
    }
}
