//! HTTP transport with rate gating and status classification
//!
//! [`HttpClient`] owns the pooled reqwest client, the optional shared
//! [`RateGate`] and the status interpreter. It performs exactly one GET per
//! call; retrying is the job of [`SingleFetcher`](super::SingleFetcher).

use super::endpoint::Endpoint;
use super::rate_limit::RateGate;
use super::status::{default_status_interpreter, StatusInterpreter};
use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("fanout-pager/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Fixed-interval retry policy for a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Sleep between attempts in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// A single attempt, no retry
    pub fn none() -> Self {
        Self::default()
    }

    /// Policy used for paged fan-out: 100 attempts, one second apart
    pub fn paging() -> Self {
        Self::new(100, Duration::from_secs(1))
    }

    /// Sleep between attempts
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// HTTP client with rate gating and status interpretation
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    gate: Option<RateGate>,
    status: StatusInterpreter,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: &HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self::from_client(client))
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            gate: None,
            status: default_status_interpreter(),
        }
    }

    /// Draw every request from the given rate budget
    #[must_use]
    pub fn with_gate(mut self, gate: RateGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the status interpreter
    #[must_use]
    pub fn with_status_interpreter(mut self, status: StatusInterpreter) -> Self {
        self.status = status;
        self
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Rate gate, if one is attached
    pub fn gate(&self) -> Option<&RateGate> {
        self.gate.as_ref()
    }

    /// Issue one GET and return the body of a successful response.
    ///
    /// Waits on the rate gate first. Every suspension point races `cancel`.
    pub async fn get_bytes(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> Result<Bytes> {
        if let Some(gate) = &self.gate {
            gate.acquire(cancel).await?;
        }

        let url = endpoint.url()?;
        let mut req = self.client.get(url.clone());
        for (key, value) in endpoint.headers.iter() {
            req = req.header(key, value);
        }
        let request = req
            .build()
            .map_err(|e| Error::config(format!("invalid request for {url}: {e}")))?;

        let exchange = async {
            let response = self.client.execute(request).await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<(StatusCode, Bytes), Error>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = exchange => result?,
        };

        (self.status)(status, &body)?;
        debug!("Request succeeded: GET {}", url);
        Ok(body)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
