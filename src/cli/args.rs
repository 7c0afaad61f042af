//! CLI argument definitions using clap
//!
//! Commands:
//! - moviematch init --config <path>
//! - moviematch serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MovieMatch - query and curate a CSV movie catalog over HTTP
#[derive(Parser, Debug)]
#[command(name = "moviematch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the catalog file with its header if it does not exist
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./moviematch.json")]
        config: PathBuf,
    },

    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./moviematch.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
