use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "overseer")]
#[command(author, version, about = "Media discovery with request and library status")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the metadata provider
    Search {
        /// Free-text query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List popular titles
    Popular,

    /// List top-rated titles
    TopRated,

    /// List upcoming releases
    Upcoming,

    /// List titles currently in theatres
    NowPlaying,

    /// Look up titles by provider id
    Details {
        /// Provider ids, resolved in the given order
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
