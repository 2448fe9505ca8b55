//! The HTTP seam between the client and the network.
//!
//! [`SearchIndexClient`](crate::SearchIndexClient) only ever builds an
//! [`HttpRequest`] and inspects the [`HttpResponse`] it gets back; connection
//! handling, TLS and timeouts live behind [`Transport`].

use crate::{ClientConfig, Result};
use reqwest::Client as HttpClient;
use reqwest::Method;
use std::time::Duration;

/// A fully built request: method, absolute URL, headers, optional JSON body
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// Status code and raw body text of a response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a `reqwest` connection pool
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }

    /// Apply the timeout and certificate settings from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = HttpClient::builder().timeout(Duration::from_secs(config.timeout_secs));

        if config.insecure_skip_verify {
            tracing::warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
