// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # fanout-pager
//!
//! Rate-limited, wave-based concurrent fetching for paginated HTTP read APIs.
//!
//! ## Features
//!
//! - **Shared Rate Budget**: One token bucket gates every request of a client
//! - **Fixed Retry**: Constant-interval retries of transient failures per page
//! - **Wave Fan-out**: Pages fetched `C` at a time, in order, with early stop
//! - **Cancellation**: One token aborts gate waits, requests and retry sleeps
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fanout_pager::{ApiClient, ClientConfig, PageShape, QueryParams};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> fanout_pager::Result<()> {
//!     let config = ClientConfig::from_yaml_file("client.yaml")?;
//!     let client = ApiClient::new(config, None)?;
//!     let cancel = CancellationToken::new();
//!
//!     let params = client.paging_params(250).page_size(100).max_concurrency(3);
//!     let transfers = client
//!         .paged::<serde_json::Value>(
//!             "account/transfer",
//!             QueryParams::new().with("address", "abc"),
//!             PageShape::List,
//!             params,
//!             &cancel,
//!         )
//!         .await?;
//!
//!     println!("{} transfers", transfers.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ApiClient                              │
//! │   get()   page()   paged()   export()   walk_cursor()           │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬──────────────────────┐
//! │  PagedFetch  │        BatchRunner        │      CursorWalk      │
//! │  plan pages  │  waves, slots, finish     │  serial `before`     │
//! └──────────────┴───────────────┬───────────┴──────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬──────────────────────┐
//! │   RateGate   │       SingleFetcher       │      Decoders        │
//! │ token bucket │ GET, status, fixed retry  │ envelope, raw, page  │
//! └──────────────┴───────────────────────────┴──────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP transport, rate gate and retrying fetcher
pub mod http;

/// Response decoders
pub mod decode;

/// Wave-based paging and cursor walks
pub mod pagination;

/// Client configuration
pub mod config;

/// API client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::ClientConfig;
pub use http::{Endpoint, Fetch, HttpClient, RateGate, RateGateConfig, RateTier, RetryPolicy};
pub use pagination::{BatchRunner, CursorWalk, Page, PageShape, PagedFetch, PagingParams};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
