//! Request and response descriptors
//!
//! The transport reads every response body into memory so that a response
//! can be cached, replayed and decoded more than once.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

/// Header set on responses served from the cache
pub const CACHE_HIT_HEADER: &str = "x-from-cache";

/// Description of one outbound read request
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method (always GET for this client)
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Extra request headers
    pub headers: HeaderMap,
}

impl Request {
    /// Create a GET request for an absolute URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header
    ///
    /// Invalid header names or values are ignored.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create a response from its parts
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as (lossy) UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the response was served from the cache
    pub fn from_cache(&self) -> bool {
        self.headers
            .get(CACHE_HIT_HEADER)
            .is_some_and(|v| v.as_bytes() == b"1")
    }

    /// Mark this response as a cache hit
    pub(crate) fn mark_cached(mut self) -> Self {
        self.headers
            .insert(CACHE_HIT_HEADER, HeaderValue::from_static("1"));
        self
    }
}
