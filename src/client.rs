//! API client facade
//!
//! [`ApiClient`] binds one [`ClientConfig`] to a transport and a rate gate and
//! exposes the call patterns of a paged read API: single enveloped calls,
//! single pages, fanned-out paged lists, raw exports and cursor walks.

use crate::config::ClientConfig;
use crate::decode::{self, BodyFormat};
use crate::error::Result;
use crate::http::{Endpoint, HttpClient, RateGate, SingleFetcher, StatusInterpreter};
use crate::pagination::{CursorWalk, Page, PageShape, PagedFetch, PagingParams};
use crate::types::{HeaderSet, QueryParams};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for one upstream API
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http: HttpClient,
    headers: HeaderSet,
}

impl ApiClient {
    /// Build a client. Without an explicit gate one is created from the
    /// config's budget; pass a shared gate to pool the budget across clients.
    pub fn new(config: ClientConfig, gate: Option<RateGate>) -> Result<Self> {
        config.validate()?;
        let gate = gate.unwrap_or_else(|| RateGate::new(&config.rate_gate_config()));
        let http = HttpClient::with_config(&config.http_config())?.with_gate(gate);
        let headers = config.static_headers();

        debug!(
            "Created client for {} ({} requests per {} ms)",
            config.base_url,
            http.gate().map_or(0, |g| g.config().capacity),
            http.gate().map_or(0, |g| g.config().window_ms)
        );

        Ok(Self {
            config,
            http,
            headers,
        })
    }

    /// Replace the status interpreter
    #[must_use]
    pub fn with_status_interpreter(mut self, status: StatusInterpreter) -> Self {
        self.http = self.http.with_status_interpreter(status);
        self
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Endpoint under this client's base URL, carrying its static headers
    pub fn endpoint(&self, path: &str, query: QueryParams) -> Endpoint {
        Endpoint::new(&self.config.base_url, path)
            .with_query(query)
            .with_headers(self.headers.clone())
    }

    /// Paging params for `total_size` items with the configured defaults
    pub fn paging_params(&self, total_size: u64) -> PagingParams {
        PagingParams::new(total_size)
            .start_page(self.config.paging.start_page)
            .max_concurrency(self.config.paging.max_concurrency)
    }

    /// One enveloped call, returning `data`
    pub async fn get<D>(&self, path: &str, query: QueryParams, cancel: &CancellationToken) -> Result<D>
    where
        D: DeserializeOwned + Send + 'static,
    {
        self.get_as(path, query, BodyFormat::Envelope, cancel).await
    }

    /// One call whose body is decoded as `format`
    pub async fn get_as<D>(
        &self,
        path: &str,
        query: QueryParams,
        format: BodyFormat,
        cancel: &CancellationToken,
    ) -> Result<D>
    where
        D: DeserializeOwned + Send + 'static,
    {
        SingleFetcher::new(self.http.clone(), self.endpoint(path, query), format.decoder())
            .with_retry(self.config.retry)
            .fetch(cancel)
            .await
    }

    /// One page of a list endpoint, exactly as the query asks for it
    pub async fn page<T>(
        &self,
        path: &str,
        query: QueryParams,
        shape: PageShape,
        cancel: &CancellationToken,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        PagedFetch::new(self.http.clone(), self.endpoint(path, query), shape)
            .with_retry(self.config.retry)
            .fetch(cancel)
            .await
    }

    /// Up to `params.total_size` items of a list endpoint, fetched in waves
    pub async fn paged<T>(
        &self,
        path: &str,
        query: QueryParams,
        shape: PageShape,
        params: PagingParams,
        cancel: &CancellationToken,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        PagedFetch::new(self.http.clone(), self.endpoint(path, query), shape)
            .with_retry(self.config.paging_retry)
            .with_paging(params)
            .fetch(cancel)
            .await
    }

    /// Raw body of an export endpoint
    pub async fn export(
        &self,
        path: &str,
        query: QueryParams,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        SingleFetcher::new(self.http.clone(), self.endpoint(path, query), decode::raw())
            .with_retry(self.config.retry)
            .fetch(cancel)
            .await
    }

    /// Serial cursor walk of a list endpoint
    pub async fn walk_cursor<T>(
        &self,
        path: &str,
        query: QueryParams,
        walk: &CursorWalk<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        walk.fetch(
            &self.http,
            &self.endpoint(path, query),
            self.config.paging_retry,
            cancel,
        )
        .await
    }
}
