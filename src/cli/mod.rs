//! CLI module
//!
//! Thin command-line harness over [`ApiClient`](crate::client::ApiClient).
//!
//! # Commands
//!
//! - `get` - Fetch one enveloped resource
//! - `pages` - Fetch a paged list in concurrent waves
//! - `export` - Download an export endpoint unchanged

mod commands;
mod runner;

pub use commands::{parse_query_pair, Cli, Commands};
pub use runner::Runner;
