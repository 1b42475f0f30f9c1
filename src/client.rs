//! Gutendex API client
//!
//! [`Client`] builds endpoint URLs and hands requests to a shared
//! [`HttpClient`]. Listing returns a lazy [`PageIter`]; single-book lookups
//! go through the same classification as page fetches.

use crate::config::ClientConfig;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::models::Book;
use crate::pagination::PageIter;
use crate::query::Query;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const GET_BOOK_OP: &str = "get_book";

/// Read-only client for the Gutendex catalog
#[derive(Debug, Clone)]
pub struct Client {
    http: Arc<HttpClient>,
    base_url: Url,
}

impl Client {
    /// Client for the public endpoint with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Client built from a full configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::with_config(config.http_config())?;
        Self::with_http_client(&config.base_url, Arc::new(http))
    }

    /// Client over an existing transport
    ///
    /// Clients sharing one `HttpClient` share its rate limiter and cache.
    pub fn with_http_client(base_url: &str, http: Arc<HttpClient>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }
        Ok(Self { http, base_url })
    }

    /// Underlying transport
    pub fn http_client(&self) -> &Arc<HttpClient> {
        &self.http
    }

    /// API root
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lazily list books matching `query`
    ///
    /// No request is made until the iterator is first advanced.
    pub fn list_books(&self, query: &Query) -> PageIter<Book> {
        let mut url = self.endpoint(&["books"]);
        query.apply(&mut url);
        debug!(url = %url, "listing books");
        PageIter::new(Arc::clone(&self.http), url.to_string())
    }

    /// Lazily list books whose author matches `keyword`
    pub fn search(&self, keyword: &str) -> PageIter<Book> {
        self.list_books(&Query::new().author(keyword))
    }

    /// Fetch a single book by id
    pub async fn get_book(&self, ctx: &RequestContext, id: u64) -> Result<Book> {
        let url = self.endpoint(&["books", &id.to_string()]);
        self.http.get_json(ctx, GET_BOOK_OP, url.as_str()).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
