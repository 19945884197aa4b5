//! Endpoint request description
//!
//! An [`Endpoint`] is the immutable `(base URL, path, query, headers)` tuple a
//! fetch is issued against. Paging derives per-page copies through
//! [`Endpoint::with_query_set`].

use crate::error::Result;
use crate::types::{HeaderSet, QueryParams};
use url::Url;

/// A fully described GET target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL, e.g. `https://api.example.com/v2.0`
    pub base_url: String,
    /// Resource path relative to the base URL
    pub path: String,
    /// Query parameters
    pub query: QueryParams,
    /// Headers sent with the request
    pub headers: HeaderSet,
}

impl Endpoint {
    /// Create an endpoint with no query or headers
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Replace the query parameters
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Replace the header set
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Add a single header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Copy of this endpoint with one query parameter overwritten
    #[must_use]
    pub fn with_query_set(&self, key: &str, value: impl ToString) -> Self {
        let mut endpoint = self.clone();
        endpoint.query.set(key, value);
        endpoint
    }

    /// `base_url/path` with surrounding slashes normalized, as plain text
    pub fn location(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Full URL including the encoded query string.
    ///
    /// The path is joined onto the base URL's path, so a query already on the
    /// base URL is kept ahead of the endpoint's own parameters.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        let path = self.path.trim_matches('/');
        if !path.is_empty() {
            let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
            url.set_path(&joined);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// Display form used in logs; falls back to the unparsed location
    pub fn display_url(&self) -> String {
        match self.url() {
            Ok(url) => url.to_string(),
            Err(_) => self.location(),
        }
    }
}
