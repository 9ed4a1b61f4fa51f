use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quilter", about = "Track quilt-style patch series", version)]
pub struct Cli {
    /// Explicit configuration file (skips the search path)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync tracked repositories and rebuild their cached reports
    Refresh {
        /// Refresh only the named repository
        #[arg(long)]
        repo: Option<String>,

        /// Drop the cache before refreshing
        #[arg(long)]
        clear: bool,
    },

    /// Show the cached report for a repository
    Report {
        /// Repository name from the configuration
        repo: String,
    },

    /// Show patch activity for a repository
    Activity {
        /// Repository name from the configuration
        repo: String,

        /// Only show events at or after this time (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },

    /// Cache management
    Cache {
        #[command(subcommand)]
        cmd: CacheCommand,
    },
}

#[derive(Subcommand, Clone)]
pub enum CacheCommand {
    /// Drop every cached report and tracker lookup
    Clear,
}
