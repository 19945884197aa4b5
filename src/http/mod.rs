//! HTTP module
//!
//! Provides the rate gate, endpoint description, status mapping and the
//! retrying single-resource fetcher.
//!
//! # Features
//!
//! - **Rate Gate**: Shared token bucket using governor, cancelable acquisition
//! - **Status Mapping**: Fixed status-to-error classification, injectable
//! - **Fixed Retry**: Constant-interval retries of transient failures
//! - **Cancellation**: Every wait races one `CancellationToken`

mod client;
mod endpoint;
mod fetcher;
mod rate_limit;
mod status;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RetryPolicy};
pub use endpoint::Endpoint;
pub use fetcher::{Fetch, SingleFetcher};
pub use rate_limit::{
    RateGate, RateGateConfig, RateTier, PRO_REQUESTS_PER_MINUTE, STANDARD_REQUESTS_PER_MINUTE,
};
pub use status::{default_status_interpreter, interpret_status, StatusInterpreter};

#[cfg(test)]
mod tests;
