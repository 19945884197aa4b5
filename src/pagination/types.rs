//! Pagination types
//!
//! Defines the page result union, the shape selector that picks a decoder and
//! reducer for it, and the predicate/reducer handles the batch runner consumes.

use crate::decode::{decode_envelope, BodyDecoder};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Predicate telling the runner a result was the last page
pub type FinishSignal<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;

/// Merges positional result slots into one value; `None` slots were never fetched
pub type Reducer<D> = Arc<dyn Fn(Vec<Option<D>>) -> Result<D> + Send + Sync>;

// ============================================================================
// Page
// ============================================================================

/// One decoded page, in one of the three response layouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Page<T> {
    /// `data` is a bare list
    List(Vec<T>),
    /// `data` is `{"items": [...], "total": n}`
    Items { items: Vec<T>, total: u64 },
    /// `data` is `{"data": [...], "total": n}`
    Data { data: Vec<T>, total: u64 },
}

impl<T> Page<T> {
    /// Empty page of the given shape
    pub fn empty(shape: PageShape) -> Self {
        shape.assemble(Vec::new(), 0)
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Check if the page has no items
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Items on this page
    pub fn items(&self) -> &[T] {
        match self {
            Page::List(items) | Page::Items { items, .. } | Page::Data { data: items, .. } => {
                items
            }
        }
    }

    /// Take the items, dropping any reported total
    pub fn into_items(self) -> Vec<T> {
        match self {
            Page::List(items) | Page::Items { items, .. } | Page::Data { data: items, .. } => {
                items
            }
        }
    }

    /// Grand total reported by the upstream, for shapes that carry one
    pub fn total(&self) -> Option<u64> {
        match self {
            Page::List(_) => None,
            Page::Items { total, .. } | Page::Data { total, .. } => Some(*total),
        }
    }

    /// Shape of this page
    pub fn shape(&self) -> PageShape {
        match self {
            Page::List(_) => PageShape::List,
            Page::Items { .. } => PageShape::Items,
            Page::Data { .. } => PageShape::Data,
        }
    }
}

// ============================================================================
// PageShape
// ============================================================================

#[derive(Deserialize)]
struct ItemsBody<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct DataBody<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    total: u64,
}

/// Response layout of a paged endpoint
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PageShape {
    /// Bare list
    #[default]
    List,
    /// Items plus grand total
    Items,
    /// Data plus grand total
    Data,
}

impl PageShape {
    /// Decode an enveloped body of this shape. A `null` payload is an empty page.
    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<Page<T>> {
        Ok(match self {
            PageShape::List => {
                Page::List(decode_envelope::<Option<Vec<T>>>(body)?.unwrap_or_default())
            }
            PageShape::Items => match decode_envelope::<Option<ItemsBody<T>>>(body)? {
                Some(page) => Page::Items {
                    items: page.items,
                    total: page.total,
                },
                None => Page::empty(self),
            },
            PageShape::Data => match decode_envelope::<Option<DataBody<T>>>(body)? {
                Some(page) => Page::Data {
                    data: page.data,
                    total: page.total,
                },
                None => Page::empty(self),
            },
        })
    }

    /// Decoder handle for this shape
    pub fn decoder<T: DeserializeOwned + 'static>(self) -> BodyDecoder<Page<T>> {
        Arc::new(move |body: &[u8]| self.decode::<T>(body))
    }

    /// Concatenate present slots in order, truncate to `total_size`, and keep
    /// the largest reported total
    pub fn reduce<T>(self, slots: Vec<Option<Page<T>>>, total_size: u64) -> Page<T> {
        let pages: Vec<Page<T>> = slots.into_iter().flatten().collect();
        let mut items = Vec::with_capacity(pages.iter().map(Page::len).sum());
        let mut total = 0;
        for page in pages {
            total = total.max(page.total().unwrap_or(0));
            items.extend(page.into_items());
        }
        items.truncate(usize::try_from(total_size).unwrap_or(usize::MAX));
        self.assemble(items, total)
    }

    /// Reducer handle for this shape
    pub fn reducer<T: Send + 'static>(self, total_size: u64) -> Reducer<Page<T>> {
        Arc::new(move |slots: Vec<Option<Page<T>>>| {
            Ok::<_, Error>(self.reduce(slots, total_size))
        })
    }

    fn assemble<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        match self {
            PageShape::List => Page::List(items),
            PageShape::Items => Page::Items { items, total },
            PageShape::Data => Page::Data { data: items, total },
        }
    }
}

/// Finish signal of the form "fewer items than the page size"
pub fn short_page<T: 'static>(page_size: u64) -> FinishSignal<Page<T>> {
    Arc::new(move |page: &Page<T>| (page.len() as u64) < page_size)
}

// ============================================================================
// PagingParams
// ============================================================================

/// What the caller wants from a paged endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingParams {
    /// First page index (1-based upstream numbering)
    pub start_page: u64,
    /// Maximum number of items to return
    pub total_size: u64,
    /// Requests per wave
    pub max_concurrency: usize,
    /// Items per page; read from the endpoint's page-size parameter when unset
    pub page_size: Option<u64>,
}

impl PagingParams {
    /// Up to `total_size` items from page 1, one request at a time
    pub fn new(total_size: u64) -> Self {
        Self {
            start_page: 1,
            total_size,
            max_concurrency: 1,
            page_size: None,
        }
    }

    /// Set the first page
    #[must_use]
    pub fn start_page(mut self, page: u64) -> Self {
        self.start_page = page;
        self
    }

    /// Set the wave size
    #[must_use]
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = concurrency;
        self
    }

    /// Set the page size explicitly
    #[must_use]
    pub fn page_size(mut self, size: u64) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Number of pages needed for `total_size` items
    pub fn page_count(&self, page_size: u64) -> u64 {
        self.total_size.div_ceil(page_size.max(1))
    }
}
