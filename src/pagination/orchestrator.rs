//! Paged fan-out over page-numbered endpoints
//!
//! [`PagedFetch`] turns `(start_page, total_size, page_size)` into one fetch
//! unit per page, hands them to a [`BatchRunner`] together with the shape's
//! reducer and a short-page finish signal, and returns the merged page.

use super::batch::BatchRunner;
use super::types::{short_page, Page, PageShape, PagingParams};
use crate::error::{Error, Result};
use crate::http::{Endpoint, HttpClient, RetryPolicy, SingleFetcher};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default name of the page index query parameter
pub const PAGE_PARAM: &str = "page";
/// Default name of the page size query parameter
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Fetch of a page-numbered list endpoint, optionally fanned out in waves
pub struct PagedFetch<T> {
    client: HttpClient,
    endpoint: Endpoint,
    shape: PageShape,
    retry: RetryPolicy,
    paging: Option<PagingParams>,
    page_param: String,
    page_size_param: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + 'static> PagedFetch<T> {
    /// Single unpaged fetch of `endpoint`, decoded as `shape`
    pub fn new(client: HttpClient, endpoint: Endpoint, shape: PageShape) -> Self {
        Self {
            client,
            endpoint,
            shape,
            retry: RetryPolicy::paging(),
            paging: None,
            page_param: PAGE_PARAM.to_string(),
            page_size_param: PAGE_SIZE_PARAM.to_string(),
            _marker: PhantomData,
        }
    }

    /// Fan out across pages
    #[must_use]
    pub fn with_paging(mut self, paging: PagingParams) -> Self {
        self.paging = Some(paging);
        self
    }

    /// Retry policy applied to every page
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Rename the page index and page size query parameters
    #[must_use]
    pub fn with_page_params(
        mut self,
        page_param: impl Into<String>,
        page_size_param: impl Into<String>,
    ) -> Self {
        self.page_param = page_param.into();
        self.page_size_param = page_size_param.into();
        self
    }

    /// Page size from the params, else from the endpoint's query
    pub fn resolve_page_size(&self, paging: &PagingParams) -> Result<u64> {
        let size = match paging.page_size {
            Some(size) => size,
            None => {
                let raw = self.endpoint.query.get(&self.page_size_param).ok_or_else(|| {
                    Error::config(format!(
                        "page size is not set: pass one explicitly or set the '{}' query parameter",
                        self.page_size_param
                    ))
                })?;
                raw.parse::<u64>().map_err(|e| {
                    Error::config(format!(
                        "invalid '{}' query parameter '{}': {}",
                        self.page_size_param, raw, e
                    ))
                })?
            }
        };

        if size == 0 {
            return Err(Error::config("page size must be greater than zero"));
        }
        Ok(size)
    }

    /// One endpoint per page, in page order
    pub fn page_endpoints(&self, paging: &PagingParams, page_size: u64) -> Result<Vec<Endpoint>> {
        let count = paging.page_count(page_size);
        if count > 0 && paging.start_page.checked_add(count - 1).is_none() {
            return Err(Error::config(format!(
                "{} pages from start page {} overflow the page index",
                count, paging.start_page
            )));
        }

        let base = self
            .endpoint
            .with_query_set(&self.page_size_param, page_size);
        Ok((0..count)
            .map(|offset| base.with_query_set(&self.page_param, paging.start_page + offset))
            .collect())
    }

    /// Run the fetch
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<Page<T>> {
        let decoder = self.shape.decoder::<T>();

        let Some(paging) = &self.paging else {
            return SingleFetcher::new(self.client.clone(), self.endpoint.clone(), decoder)
                .with_retry(self.retry)
                .fetch(cancel)
                .await;
        };

        let page_size = self.resolve_page_size(paging)?;
        let units: Vec<SingleFetcher<Page<T>>> = self
            .page_endpoints(paging, page_size)?
            .into_iter()
            .map(|endpoint| {
                SingleFetcher::new(self.client.clone(), endpoint, decoder.clone())
                    .with_retry(self.retry)
            })
            .collect();

        debug!(
            "Paging {} into {} pages of {} (start {}, concurrency {})",
            self.endpoint.display_url(),
            units.len(),
            page_size,
            paging.start_page,
            paging.max_concurrency
        );

        BatchRunner::new(paging.max_concurrency, self.shape.reducer(paging.total_size))
            .with_finish_signal(short_page(page_size))
            .run(&units, cancel)
            .await
    }
}

impl<T> std::fmt::Debug for PagedFetch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFetch")
            .field("endpoint", &self.endpoint)
            .field("shape", &self.shape)
            .field("retry", &self.retry)
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}
