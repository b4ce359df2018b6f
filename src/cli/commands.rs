//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shopfront SDK CLI
#[derive(Parser, Debug)]
#[command(name = "shopfront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client config file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode an access token and print its claims
    Decode {
        /// The token string
        token: String,
    },

    /// Perform one token refresh call and print the renewed claims
    Refresh {
        /// Base URL of the backend (overrides the config file)
        #[arg(long)]
        base_url: Option<String>,
    },
}
