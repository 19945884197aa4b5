//! CLI commands and argument parsing

use crate::decode::BodyFormat;
use crate::error::{Error, Result};
use crate::pagination::PageShape;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rate-limited paged fetcher for HTTP read APIs
#[derive(Parser, Debug)]
#[command(name = "fanout-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API token, overrides the config
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Base URL, overrides the config
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one enveloped resource and print its data
    Get {
        /// Resource path relative to the base URL
        path: String,

        /// Body layout
        #[arg(long, default_value = "envelope")]
        format: BodyFormat,

        /// Query parameter (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
    },

    /// Fetch a paged list in concurrent waves
    Pages {
        /// Resource path relative to the base URL
        path: String,

        /// Maximum number of items to fetch
        #[arg(long)]
        total: u64,

        /// Items per page (defaults to the page_size query parameter)
        #[arg(long)]
        page_size: Option<u64>,

        /// First page
        #[arg(long)]
        start_page: Option<u64>,

        /// Requests per wave
        #[arg(long)]
        concurrency: Option<usize>,

        /// Response layout
        #[arg(long, default_value = "list")]
        shape: PageShape,

        /// Query parameter (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
    },

    /// Download an export endpoint unchanged
    Export {
        /// Resource path relative to the base URL
        path: String,

        /// Query parameter (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parse a `key=value` query argument
pub fn parse_query_pair(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(Error::config(format!(
            "invalid query parameter '{arg}': expected KEY=VALUE"
        ))),
    }
}
