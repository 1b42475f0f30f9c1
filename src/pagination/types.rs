//! Pagination types
//!
//! Defines the page envelope and the iterator's state.

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};

/// A paginated response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of results across all pages
    #[serde(default)]
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Results of this page, in server order (`null` reads as empty)
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_empty",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub results: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> Page<T> {
    /// Next page URL, treating an empty string as absent
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|url| !url.is_empty())
    }

    /// Check if this is the last page
    pub fn is_last(&self) -> bool {
        self.next_url().is_none()
    }
}

/// State of a [`PageIter`](super::PageIter)
#[derive(Debug)]
pub enum IterState {
    /// Positioned before the first item, nothing fetched yet
    NotStarted,
    /// Positioned on the buffered item at this index
    HasItem(usize),
    /// No more items; terminal
    Exhausted,
    /// A page fetch failed; terminal
    Failed(Error),
}

impl IterState {
    /// Check if the iterator can never advance again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed(_))
    }

    /// Latched error, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
