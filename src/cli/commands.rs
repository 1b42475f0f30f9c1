//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gutendex catalog CLI
#[derive(Parser, Debug)]
#[command(name = "gutendex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single book by id
    Get {
        /// Book id
        id: u64,
    },

    /// List books matching filters
    List {
        /// Author name fragment
        #[arg(long)]
        author: Option<String>,

        /// Title fragment (combined with --author into one search term)
        #[arg(long)]
        title: Option<String>,

        /// Subject or bookshelf fragment
        #[arg(long)]
        topic: Option<String>,

        /// Language codes, comma-separated
        #[arg(long)]
        language: Option<String>,

        /// MIME type prefix
        #[arg(long)]
        mime: Option<String>,

        /// Maximum books to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List books whose author matches a keyword
    Search {
        /// Author keyword
        keyword: String,

        /// Maximum books to print
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one book per line)
    Json,
    /// Indented JSON
    Pretty,
}
