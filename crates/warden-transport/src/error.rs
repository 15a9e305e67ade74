use crate::RequestId;

/// Boxed error produced by an underlying HTTP client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured base URL can't be used to build request URLs.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("client setup failed: {0}")]
    Setup(#[source] BoxError),

    /// The request did not complete within the configured timeout.
    #[error("request {0} timed out")]
    Timeout(RequestId),

    /// The request could not be sent or no response arrived.
    #[error("request {id} failed: {source}")]
    RequestFailed {
        id: RequestId,
        #[source]
        source: BoxError,
    },

    /// A response arrived but its body could not be read.
    #[error("reading response for request {id} failed: {source}")]
    ReadFailed {
        id: RequestId,
        #[source]
        source: BoxError,
    },
}
