//! Catalog resource types
//!
//! Field names follow the Gutendex JSON representation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An author or translator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub translators: Vec<Person>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub bookshelves: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub copyright: Option<bool>,
    #[serde(default)]
    pub media_type: String,
    /// MIME type → download URL
    #[serde(default)]
    pub formats: HashMap<String, String>,
    #[serde(default)]
    pub download_count: u64,
}

impl Book {
    /// Names of all authors joined with "; "
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
