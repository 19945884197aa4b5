//! Single resource fetch with retry
//!
//! [`SingleFetcher`] executes exactly one logical fetch: gate, GET, status
//! check, decode. Transient failures are retried on a fixed interval up to
//! [`RetryPolicy::max_attempts`]; decode failures are terminal.

use super::client::{HttpClient, RetryPolicy};
use super::endpoint::Endpoint;
use crate::decode::BodyDecoder;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A unit of work the batch runner can schedule
#[async_trait]
pub trait Fetch<D>: Send + Sync {
    /// Produce one decoded result
    async fn fetch(&self, cancel: &CancellationToken) -> Result<D>;

    /// Target description for logs
    fn describe(&self) -> String;
}

/// One GET against one endpoint, decoded through an injected decoder
pub struct SingleFetcher<D> {
    client: HttpClient,
    endpoint: Endpoint,
    decoder: BodyDecoder<D>,
    retry: RetryPolicy,
}

impl<D> SingleFetcher<D> {
    /// Create a fetcher with a single attempt
    pub fn new(client: HttpClient, endpoint: Endpoint, decoder: BodyDecoder<D>) -> Self {
        Self {
            client,
            endpoint,
            decoder,
            retry: RetryPolicy::none(),
        }
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Target endpoint
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Retry policy in effect
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn attempt(&self, cancel: &CancellationToken) -> Result<D> {
        let body = self.client.get_bytes(&self.endpoint, cancel).await?;
        (self.decoder)(&body)
    }

    /// Fetch and decode, retrying transient failures
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<D> {
        let max_attempts = self.retry.max_attempts.max(1);
        if max_attempts == 1 {
            return self.attempt(cancel).await;
        }

        let mut attempt = 1;
        loop {
            let err = match self.attempt(cancel).await {
                Ok(data) => return Ok(data),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                return Err(Error::RetriesExhausted {
                    attempts: max_attempts,
                    last: Box::new(err),
                });
            }

            let interval = self.retry.interval();
            warn!(
                "Failed to get {}: {}, attempt {}/{}, retrying in {:?}",
                self.endpoint.display_url(),
                err,
                attempt,
                max_attempts,
                interval
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(interval) => {}
            }
            attempt += 1;
        }
    }
}

impl<D> Clone for SingleFetcher<D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            decoder: self.decoder.clone(),
            retry: self.retry,
        }
    }
}

impl<D> std::fmt::Debug for SingleFetcher<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFetcher")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Send + 'static> Fetch<D> for SingleFetcher<D> {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<D> {
        SingleFetcher::fetch(self, cancel).await
    }

    fn describe(&self) -> String {
        self.endpoint.display_url()
    }
}
