//! Pagination module
//!
//! Turns a cursor-linked paginated endpoint into a forward-only sequence.
//!
//! # Overview
//!
//! Each page is a [`Page`] envelope: a total count, optional `next` and
//! `previous` URLs and the page's results. [`PageIter`] fetches one page at
//! a time through the shared [`HttpClient`](crate::http::HttpClient),
//! hands out its items one by one and only follows `next` once the buffered
//! page is used up. A failed page fetch is latched and reported by
//! [`PageIter::last_error`].

mod iterator;
mod types;

pub use iterator::PageIter;
pub use types::{IterState, Page};

#[cfg(test)]
mod tests;
