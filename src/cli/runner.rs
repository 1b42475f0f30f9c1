//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::Book;
use crate::pagination::PageIter;
use crate::query::Query;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = Client::with_config(&self.load_config()?)?;

        match &self.cli.command {
            Commands::Get { id } => self.get(&client, *id).await,
            Commands::List {
                author,
                title,
                topic,
                language,
                mime,
                limit,
            } => {
                let query = Query {
                    author: author.clone(),
                    title: title.clone(),
                    topic: topic.clone(),
                    language: language.clone(),
                    mime: mime.clone(),
                };
                self.drain(client.list_books(&query), *limit).await
            }
            Commands::Search { keyword, limit } => {
                self.drain(client.search(keyword), *limit).await
            }
        }
    }

    fn load_config(&self) -> Result<ClientConfig> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        match &self.cli.base_url {
            Some(base_url) => {
                let config = config.with_base_url(base_url);
                config.validate()?;
                Ok(config)
            }
            None => Ok(config),
        }
    }

    async fn get(&self, client: &Client, id: u64) -> Result<()> {
        let book = client.get_book(&RequestContext::background(), id).await?;
        self.output_book(&book)
    }

    async fn drain(&self, mut books: PageIter<Book>, limit: Option<usize>) -> Result<()> {
        let mut printed = 0usize;
        while limit.map_or(true, |max| printed < max) && books.advance().await {
            self.output_book(books.current())?;
            printed += 1;
        }
        if let Some(err) = books.last_error() {
            return Err(Error::Other(format!("listing stopped after {printed} books: {err}")));
        }
        info!(printed, "listing finished");
        Ok(())
    }

    /// Output a book
    fn output_book(&self, book: &Book) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(book),
            OutputFormat::Pretty => serde_json::to_string_pretty(book),
        }
        .map_err(|e| Error::Other(format!("failed to encode book {}: {e}", book.id)))?;
        println!("{line}");
        Ok(())
    }
}
