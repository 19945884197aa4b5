//! Sequential cursor pagination
//!
//! Some list endpoints take a `before` cursor instead of a page number. Each
//! request depends on the previous response, so the walk is strictly serial.

use super::types::PageShape;
use crate::error::{Error, Result};
use crate::http::{Endpoint, HttpClient, RetryPolicy, SingleFetcher};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Extracts the continuation cursor from an item
pub type CursorOf<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Default name of the cursor query parameter
pub const CURSOR_PARAM: &str = "before";
/// Default name of the limit query parameter
pub const LIMIT_PARAM: &str = "limit";

/// Serial walk over a cursor-paginated list endpoint
pub struct CursorWalk<T> {
    limit: u64,
    total_size: u64,
    cursor_of: CursorOf<T>,
    start_cursor: Option<String>,
    cursor_param: String,
    limit_param: String,
}

impl<T: DeserializeOwned + Send + 'static> CursorWalk<T> {
    /// Walk up to `total_size` items, `limit` per request
    pub fn new(limit: u64, total_size: u64, cursor_of: CursorOf<T>) -> Self {
        Self {
            limit,
            total_size,
            cursor_of,
            start_cursor: None,
            cursor_param: CURSOR_PARAM.to_string(),
            limit_param: LIMIT_PARAM.to_string(),
        }
    }

    /// Begin from a known cursor instead of the newest item
    #[must_use]
    pub fn start_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.start_cursor = Some(cursor.into());
        self
    }

    /// Rename the cursor and limit query parameters
    #[must_use]
    pub fn with_params(
        mut self,
        cursor_param: impl Into<String>,
        limit_param: impl Into<String>,
    ) -> Self {
        self.cursor_param = cursor_param.into();
        self.limit_param = limit_param.into();
        self
    }

    /// Walk the list at `endpoint`, retrying each request per `retry`.
    ///
    /// Stops on a short page, on an item with no cursor, or after
    /// `ceil(total_size / limit)` requests. The result is truncated to
    /// `total_size`.
    pub async fn fetch(
        &self,
        client: &HttpClient,
        endpoint: &Endpoint,
        retry: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        if self.limit == 0 {
            return Err(Error::config("cursor limit must be greater than zero"));
        }

        let decoder = PageShape::List.decoder::<T>();
        let base = endpoint.with_query_set(&self.limit_param, self.limit);
        let max_requests = self.total_size.div_ceil(self.limit);

        let mut items = Vec::new();
        let mut cursor = self.start_cursor.clone();
        for request in 0..max_requests {
            let mut target = base.clone();
            match &cursor {
                Some(value) => {
                    target.query.set(self.cursor_param.as_str(), value);
                }
                None => target.query.remove(&self.cursor_param),
            }

            let batch = SingleFetcher::new(client.clone(), target, decoder.clone())
                .with_retry(retry)
                .fetch(cancel)
                .await?
                .into_items();

            let short = (batch.len() as u64) < self.limit;
            let next = batch.last().and_then(|item| (self.cursor_of)(item));
            items.extend(batch);
            debug!(
                "Cursor request {} returned {} items so far",
                request + 1,
                items.len()
            );

            if short {
                break;
            }
            match next {
                Some(value) => cursor = Some(value),
                None => break,
            }
        }

        items.truncate(usize::try_from(self.total_size).unwrap_or(usize::MAX));
        Ok(items)
    }
}

impl<T> std::fmt::Debug for CursorWalk<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorWalk")
            .field("limit", &self.limit)
            .field("total_size", &self.total_size)
            .field("start_cursor", &self.start_cursor)
            .finish_non_exhaustive()
    }
}
