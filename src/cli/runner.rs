//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::refresh::RefreshCoordinator;
use crate::token::{self, TokenStore};
use chrono::Utc;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Decode { token } => self.decode(token),
            Commands::Refresh { base_url } => self.refresh(base_url.as_deref()).await,
        }
    }

    /// Decode a token and print its claims, flagging expiry.
    fn decode(&self, token: &str) -> Result<()> {
        let claims = token::decode(token).map_err(|e| Error::Other(e.to_string()))?;
        println!("{}", serde_json::to_string_pretty(&claims)?);

        if claims.is_expired(Utc::now()) {
            eprintln!("warning: token expired at {}", claims.expires_at);
        }
        Ok(())
    }

    /// Fire a single refresh cycle and print the renewed claims.
    ///
    /// Authorization comes from the ambient session cookie, so this only
    /// succeeds against a backend the invoking environment is logged in to.
    async fn refresh(&self, base_url: Option<&str>) -> Result<()> {
        let config = self.load_config(base_url)?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let coordinator = RefreshCoordinator::new(&config, http, TokenStore::new());
        match coordinator.request_refresh().await {
            Ok(renewed) => {
                println!("{}", serde_json::to_string_pretty(renewed.claims())?);
                Ok(())
            }
            Err(e) => Err(Error::token_refresh(e.to_string())),
        }
    }

    fn load_config(&self, base_url: Option<&str>) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_yaml_file(path)?,
            None => {
                let base = base_url.ok_or_else(|| Error::missing_field("base_url"))?;
                ClientConfig::new(base)
            }
        };

        if let Some(base) = base_url {
            config.base_url = base.to_string();
        }
        config.validate()?;
        Ok(config)
    }
}
