//! CLI module
//!
//! Command-line interface over the catalog client.
//!
//! # Commands
//!
//! - `get` - Fetch one book by id
//! - `list` - List books matching filters
//! - `search` - List books by author keyword

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
