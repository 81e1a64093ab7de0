//! CLI module for the compliant cache
//!
//! Each subcommand runs one cache operation against the backend selected in
//! the application configuration and prints its result as JSON.

pub mod cache;

use clap::{Parser, Subcommand};

/// Compliant cache - strict cache semantics over loosely typed stores
#[derive(Parser)]
#[command(name = "compliant-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the value stored under a key
    Get {
        key: String,
        /// JSON value printed on a miss
        #[arg(long)]
        default: Option<String>,
    },

    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON value; anything that is not valid JSON is stored as a string
        value: String,
        /// Time to live in seconds; zero or negative deletes
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<i64>,
    },

    /// Remove a key
    Delete { key: String },

    /// Report whether a key holds a live value
    Has { key: String },

    /// Remove every entry
    Clear,
}
