//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, QueryParams};
use serde::Serialize;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts the running command
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolve the client configuration from the config file and flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match (&self.cli.config, &self.cli.base_url) {
            (Some(path), _) => ClientConfig::from_yaml_file(path)?,
            (None, Some(base_url)) => ClientConfig::new(base_url.clone()),
            (None, None) => {
                return Err(Error::config(
                    "no client configuration: pass --config or --base-url",
                ))
            }
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(token) = &self.cli.token {
            config.auth_token = Some(token.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Run the CLI command, cancelling it on Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });

        let client = ApiClient::new(self.client_config()?, None)?;
        match &self.cli.command {
            Commands::Get {
                path,
                format,
                query,
            } => {
                let data: JsonValue = client
                    .get_as(path, to_query(query), *format, &self.cancel)
                    .await?;
                print_json(&data)
            }
            Commands::Pages {
                path,
                total,
                page_size,
                start_page,
                concurrency,
                shape,
                query,
            } => {
                let mut params = client.paging_params(*total);
                if let Some(size) = page_size {
                    params = params.page_size(*size);
                }
                if let Some(page) = start_page {
                    params = params.start_page(*page);
                }
                if let Some(concurrency) = concurrency {
                    params = params.max_concurrency(*concurrency);
                }

                let page = client
                    .paged::<JsonValue>(path, to_query(query), *shape, params, &self.cancel)
                    .await?;
                info!("Fetched {} items from {}", page.len(), path);
                print_json(&page)
            }
            Commands::Export {
                path,
                query,
                output,
            } => {
                let body = client.export(path, to_query(query), &self.cancel).await?;
                match output {
                    Some(file) => {
                        std::fs::write(file, &body)?;
                        info!("Wrote {} bytes to {}", body.len(), file.display());
                    }
                    None => std::io::stdout().write_all(&body)?,
                }
                Ok(())
            }
        }
    }
}

fn to_query(pairs: &[(String, String)]) -> QueryParams {
    pairs.iter().cloned().collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_client_config_requires_a_source() {
        let runner = Runner::new(Cli::parse_from(["fanout-pager", "get", "chaininfo"]));
        assert!(matches!(runner.client_config(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: https://api.example.com").unwrap();
        writeln!(file, "auth_token: from-file").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let runner = Runner::new(Cli::parse_from([
            "fanout-pager",
            "-C",
            path.as_str(),
            "--token",
            "from-flag",
            "--base-url",
            "https://other.example.com",
            "get",
            "chaininfo",
        ]));

        let config = runner.client_config().unwrap();
        assert_eq!(config.base_url, "https://other.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_to_query_keeps_order_and_repeats() {
        let query = to_query(&[
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "3".to_string()),
        ]);
        assert_eq!(query.encode(), "a=1&b=2&a=3");
    }
}
