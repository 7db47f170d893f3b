//! HTTP client for a SPARQL endpoint.
//!
//! One request shape: POST the rendered query as `application/sparql-query`,
//! accept `application/sparql-results+json`, parse the bindings. No retries;
//! a non-success response surfaces its body verbatim so the caller can hand
//! the store's own message back to the user.

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use thiserror::Error;

use trellis_query::sparql::results::ResultsDocument;
use trellis_query::SolutionRow;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures while executing a query against the store.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("store request failed: {0}")]
    Transport(String),

    /// The per-request deadline elapsed.
    #[error("store request timed out")]
    Timeout,

    /// The store answered with a non-success status; the message is the
    /// upstream body, verbatim.
    #[error("{message}")]
    Store { status: u16, message: String },

    /// The store answered 2xx but the body was not a results document.
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// A SPARQL endpoint bound to one URL.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one rendered query and parse the solution rows.
    ///
    /// `headers` are forwarded as-is; the content negotiation headers are
    /// always set by the client itself.
    pub async fn execute(
        &self,
        sparql: &str,
        headers: HeaderMap,
    ) -> Result<Vec<SolutionRow>, ClientError> {
        tracing::debug!(endpoint = %self.endpoint, "executing SPARQL query");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .header(CONTENT_TYPE, "application/sparql-query")
            .header(ACCEPT, "application/sparql-results+json")
            .timeout(self.timeout)
            .body(sparql.to_string())
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ClientError::Timeout
                } else {
                    ClientError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Store {
                status: status.as_u16(),
                message: body,
            });
        }

        let document: ResultsDocument =
            serde_json::from_str(&body).map_err(|error| ClientError::Decode(error.to_string()))?;
        tracing::debug!(rows = document.results.bindings.len(), "store answered");
        Ok(document.results.bindings)
    }
}
