use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "playready")]
#[command(author, version, about = "Converts library videos the player cannot handle")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan all libraries periodically until interrupted
    Run,

    /// Scan libraries once and exit
    Scan {
        /// Only scan the library with this name
        #[arg(short, long)]
        library: Option<String>,
    },

    /// Probe a media file and report whether it needs conversion
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the name a file would be given after conversion
    Normalize {
        /// Original filename
        #[arg(required = true)]
        name: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
