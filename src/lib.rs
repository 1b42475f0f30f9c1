// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Gutendex Client
//!
//! A resilient, read-only client for the Gutendex catalog of Project
//! Gutenberg books.
//!
//! ## Features
//!
//! - **Lazy Pagination**: Pages are fetched only as the iterator advances
//! - **Rate Limiting**: Token bucket shared by every caller of one client
//! - **Retry**: Transport failures, 429 and 5xx retried with jittered backoff
//! - **Caching**: `Cache-Control` aware response cache with revalidation
//! - **Cancellation**: Every wait honors a cancellable, deadline-bounded context
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gutendex::{Client, Query, RequestContext, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new()?;
//!
//!     let book = client.get_book(&RequestContext::background(), 84).await?;
//!     println!("{}", book.title);
//!
//!     let mut books = client.list_books(&Query::new().author("shelley"));
//!     while books.advance().await {
//!         println!("{}", books.current().title);
//!     }
//!     if let Some(err) = books.last_error() {
//!         eprintln!("listing failed: {err}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Client                                 │
//! │  list_books(query) → PageIter    get_book(id) → Book            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬───────────────────┐
//! │    Query     │        HttpClient            │    PageIter       │
//! ├──────────────┼──────────────────────────────┼───────────────────┤
//! │ author/title │ Rate Limit → Cache → Retry   │ NotStarted        │
//! │ → search     │ → Cache Store                │ HasItem/Exhausted │
//! │ topic, lang  │ status → ErrorKind           │ Failed (latched)  │
//! └──────────────┴──────────────────────────────┴───────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases
pub mod error;

/// Cancellation and deadlines
pub mod context;

/// HTTP transport with rate limiting, retry and caching
pub mod http;

/// Lazy page iteration
pub mod pagination;

// ============================================================================
// API Modules
// ============================================================================

/// Catalog resource types
pub mod models;

/// Listing filters
pub mod query;

/// Catalog client
pub mod client;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use config::{CacheConfig, ClientConfig, RetryConfig, DEFAULT_BASE_URL};
pub use context::{CancelHandle, RequestContext};
pub use error::{is_not_found, Error, ErrorKind, Result};
pub use http::{HttpClient, HttpClientConfig, RateLimiterConfig, RetryPolicy};
pub use models::{Book, Person};
pub use pagination::{IterState, Page, PageIter};
pub use query::Query;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
