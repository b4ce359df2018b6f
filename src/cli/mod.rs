//! CLI module
//!
//! Command-line interface for poking at the token pipeline.
//!
//! # Commands
//!
//! - `decode` - Decode an access token and print its claims
//! - `refresh` - Perform one refresh call against the backend

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
