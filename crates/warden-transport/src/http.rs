//! HTTP transport implementation using `reqwest`.

use std::time::Duration;

use crate::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};

/// A `reqwest`-backed [`HttpTransport`] bound to one API base URL.
///
/// Request paths are appended to the base URL, so with a base of
/// `http://localhost:8000/api` the path `/token/` becomes
/// `http://localhost:8000/api/token/`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Builds a transport for `base_url` with a per-request timeout.
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        if !(base_url.starts_with("http://")
            || base_url.starts_with("https://"))
        {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Setup(Box::new(e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!(%base_url, "HTTP transport ready");
        Ok(Self { client, base_url })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let id = request.id();
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder =
            self.client.request(method, self.url_for(request.path()));
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(id)
            } else {
                TransportError::RequestFailed {
                    id,
                    source: Box::new(e),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            TransportError::ReadFailed {
                id,
                source: Box::new(e),
            }
        })?;

        tracing::debug!(
            request_id = %id,
            method = %request.method(),
            path = request.path(),
            status,
            "response received"
        );

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
