//! CLI definitions for croscope.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// croscope CLI.
#[derive(Parser)]
#[command(name = "croscope")]
#[command(about = "Conversion-rate-optimization page analyzer")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ./config/croscope.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Analyze a page and print the merged result
    Analyze {
        /// Page URL (http or https)
        url: String,

        /// Free-form label recorded on the result
        #[arg(long)]
        label: Option<String>,

        /// Restrict the run to these models (comma separated)
        #[arg(long, value_delimiter = ',')]
        models: Option<Vec<String>>,

        /// Drop any cached result before running
        #[arg(long)]
        refresh: bool,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List vision models and whether they are ready
    Models,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration file
    Check,
    /// Print the effective configuration
    Show,
}
