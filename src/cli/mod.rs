//! CLI module for the analyzer.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// YouTube video analyzer
///
/// Pulls subtitles through yt-dlp, cleans them into a transcript and asks an
/// LLM to summarize or answer questions about the video.
#[derive(Parser, Debug)]
#[command(name = "ytva")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a single video and print the result as JSON
    Analyze {
        /// Video URL
        url: String,

        /// Comma-separated subtitle language preference (e.g. "ru,en")
        #[arg(short, long)]
        lang: Option<String>,

        /// Question or instruction for the LLM
        #[arg(short = 'P', long)]
        prompt: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}
