//! Lazy page iterator
//!
//! [`PageIter`] is a single-owner cursor: advancing takes `&mut self`, so
//! sharing one iterator between tasks needs external synchronization, which
//! is left to the caller.

use super::types::{IterState, Page};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::trace;

const FETCH_OP: &str = "iter.fetch";

/// Forward-only iterator over the items of a paginated endpoint
pub struct PageIter<T> {
    client: Arc<HttpClient>,
    ctx: RequestContext,
    next_url: Option<String>,
    buf: Vec<T>,
    state: IterState,
}

impl<T: DeserializeOwned> PageIter<T> {
    /// Create an iterator starting at `first_url`
    ///
    /// Nothing is fetched until the first [`advance`](Self::advance). An
    /// empty URL yields an iterator that is exhausted on first advance.
    pub fn new(client: Arc<HttpClient>, first_url: impl Into<String>) -> Self {
        let first_url = first_url.into();
        Self {
            client,
            ctx: RequestContext::background(),
            next_url: (!first_url.is_empty()).then_some(first_url),
            buf: Vec::new(),
            state: IterState::NotStarted,
        }
    }

    /// Run page fetches under `ctx`
    #[must_use]
    pub fn with_context(mut self, ctx: RequestContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Move to the next item
    ///
    /// Returns `true` when an item is available through
    /// [`current`](Self::current). Returns `false` once the sequence is
    /// exhausted or a page fetch failed, and keeps returning `false`
    /// afterwards.
    pub async fn advance(&mut self) -> bool {
        let position = match self.state {
            IterState::Exhausted | IterState::Failed(_) => return false,
            IterState::HasItem(index) => Some(index),
            IterState::NotStarted => None,
        };

        self.state = match position {
            Some(index) if index + 1 < self.buf.len() => IterState::HasItem(index + 1),
            _ => self.fetch_next().await,
        };
        matches!(self.state, IterState::HasItem(_))
    }

    /// Item at the current position
    ///
    /// # Panics
    ///
    /// Panics unless the last call to [`advance`](Self::advance) returned
    /// `true`.
    pub fn current(&self) -> &T {
        match self.state {
            IterState::HasItem(index) => &self.buf[index],
            IterState::NotStarted => panic!("PageIter::current called before advance"),
            IterState::Exhausted => panic!("PageIter::current called after exhaustion"),
            IterState::Failed(_) => panic!("PageIter::current called after a failed fetch"),
        }
    }

    /// The latched fetch error, if any
    pub fn last_error(&self) -> Option<&Error> {
        self.state.error()
    }

    /// Current state
    pub fn state(&self) -> &IterState {
        &self.state
    }

    /// Convert into a stream of items
    ///
    /// A fetch error is yielded once as the final element.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>>
    where
        T: Clone,
    {
        stream::unfold(Some(self), |iter| async move {
            let mut iter = iter?;
            if iter.advance().await {
                let item = iter.current().clone();
                return Some((Ok(item), Some(iter)));
            }
            match std::mem::replace(&mut iter.state, IterState::Exhausted) {
                IterState::Failed(err) => Some((Err(err), None)),
                _ => None,
            }
        })
    }

    // Cursor is cleared only after the fetch resolves; a dropped `advance`
    // refetches the same page.
    async fn fetch_next(&mut self) -> IterState {
        let Some(url) = self.next_url.clone() else {
            self.buf.clear();
            return IterState::Exhausted;
        };

        let fetched = self
            .client
            .get_json::<Page<T>>(&self.ctx, FETCH_OP, &url)
            .await;
        self.next_url = None;

        match fetched {
            Ok(page) => {
                trace!(url = %url, items = page.results.len(), next = ?page.next, "fetched page");
                self.next_url = page.next_url().map(str::to_string);
                self.buf = page.results;
                if self.buf.is_empty() {
                    IterState::Exhausted
                } else {
                    IterState::HasItem(0)
                }
            }
            Err(err) => {
                self.buf.clear();
                IterState::Failed(err)
            }
        }
    }
}

impl<T> std::fmt::Debug for PageIter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageIter")
            .field("next_url", &self.next_url)
            .field("buffered", &self.buf.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
