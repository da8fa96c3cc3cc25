//! CLI argument definitions using clap
//!
//! Commands:
//! - dynamap to-plain [--input <path>]
//! - dynamap from-plain [--input <path>]
//! - dynamap check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dynamap - typed attribute marshalling for document tables
#[derive(Parser, Debug)]
#[command(name = "dynamap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a typed item to a plain JSON document
    ToPlain {
        /// Typed item file (reads stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Convert a plain JSON document to a typed item
    FromPlain {
        /// Plain document file (reads stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Validate a mapper configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./dynamap.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
