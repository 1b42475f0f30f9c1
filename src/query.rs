//! Query parameters for listing books
//!
//! Gutendex has no combined author+title filter. When both are set they are
//! sent as a single `search` term instead of two separate parameters.

use url::Url;

/// Filters for listing books
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Author name fragment
    pub author: Option<String>,
    /// Title fragment
    pub title: Option<String>,
    /// Subject or bookshelf fragment
    pub topic: Option<String>,
    /// Language codes, comma separated (sent as `languages`)
    pub language: Option<String>,
    /// MIME type prefix (sent as `mime_type`)
    pub mime: Option<String>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by author
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Filter by title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Filter by topic (subject or bookshelf)
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Filter by language code(s), comma separated
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Filter by MIME type prefix
    #[must_use]
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Query parameters in wire order; empty values are skipped
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        match (non_empty(&self.author), non_empty(&self.title)) {
            (Some(author), Some(title)) => params.push(("search", format!("{author} {title}"))),
            (author, title) => {
                if let Some(author) = author {
                    params.push(("author", author.to_string()));
                }
                if let Some(title) = title {
                    params.push(("title", title.to_string()));
                }
            }
        }
        if let Some(topic) = non_empty(&self.topic) {
            params.push(("topic", topic.to_string()));
        }
        if let Some(language) = non_empty(&self.language) {
            params.push(("languages", language.to_string()));
        }
        if let Some(mime) = non_empty(&self.mime) {
            params.push(("mime_type", mime.to_string()));
        }

        params
    }

    /// Append the parameters to `url`
    pub fn apply(&self, url: &mut Url) {
        let params = self.params();
        if params.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &params {
            pairs.append_pair(key, value);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
