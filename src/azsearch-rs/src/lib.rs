//! azsearch Client Library
//!
//! HTTP client for the Azure Search REST API.

mod client;
pub mod transport;

pub use azsearch_core::*;
pub use client::SearchIndexClient;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service asked for backoff and retry (503)
    #[error("RetriableHttpError <{status}>: {body}")]
    Retriable { status: u16, body: String },

    #[error("Server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether the caller should back off and try again
    pub fn is_retriable(&self) -> bool {
        matches!(self, ClientError::Retriable { .. })
    }

    /// HTTP status carried by the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Retriable { status, .. } | ClientError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Map a response status to an outcome: anything up to 399 is success,
/// 503 is retriable and every other status above 399 is fatal.
pub fn classify(status: u16, body: &str) -> Result<()> {
    if status <= 399 {
        return Ok(());
    }

    if status == 503 {
        return Err(ClientError::Retriable {
            status,
            body: body.to_string(),
        });
    }

    Err(ClientError::Server {
        status,
        body: body.to_string(),
    })
}
