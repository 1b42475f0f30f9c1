//! In-process HTTP response cache
//!
//! Responses are keyed by request identity (method, URL and any extra
//! request headers) and kept with the freshness lifetime taken from
//! `Cache-Control: max-age`. Stale entries that carry an `ETag` or
//! `Last-Modified` validator are revalidated with a conditional request
//! instead of being refetched in full.
//!
//! Nothing is persisted: entries live as long as the store.

use super::request::{Request, Response};
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use reqwest::header::{
    HeaderMap, AGE, CACHE_CONTROL, CONTENT_LENGTH, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, TRANSFER_ENCODING,
};
use reqwest::StatusCode;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

/// Default number of entries kept by [`MemoryCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

// ============================================================================
// Cache Key
// ============================================================================

/// Request identity used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a request
    pub fn for_request(request: &Request) -> Self {
        let mut key = format!("{} {}", request.method, request.url);

        let mut headers: Vec<(&str, &[u8])> = request
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes()))
            .collect();
        headers.sort_unstable();
        for (name, value) in headers {
            key.push('\n');
            key.push_str(name);
            key.push(':');
            key.push_str(&String::from_utf8_lossy(value));
        }

        Self(key)
    }

    /// Key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Freshness
// ============================================================================

/// Freshness metadata derived from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    /// How long the response stays fresh after it was stored
    pub max_age: Duration,
}

impl Freshness {
    /// Parse `Cache-Control` (and `Age`) into freshness metadata
    ///
    /// Returns `None` when the response must not be stored: `no-store`, or
    /// no `max-age` / `no-cache` directive at all. `no-cache` yields a zero
    /// lifetime so the entry is always revalidated.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut max_age = None;
        let mut no_cache = false;

        for value in headers.get_all(CACHE_CONTROL) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for directive in value.split(',') {
                let directive = directive.trim();
                let (name, arg) = match directive.split_once('=') {
                    Some((name, arg)) => (name.trim(), Some(arg.trim().trim_matches('"'))),
                    None => (directive, None),
                };
                match name.to_ascii_lowercase().as_str() {
                    "no-store" => return None,
                    "no-cache" => no_cache = true,
                    "max-age" => {
                        if let Some(secs) = arg.and_then(|a| a.parse::<u64>().ok()) {
                            max_age = Some(secs);
                        }
                    }
                    _ => {}
                }
            }
        }

        let secs = if no_cache { Some(0) } else { max_age }?;
        let age = headers
            .get(AGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Some(Self {
            max_age: Duration::from_secs(secs.saturating_sub(age)),
        })
    }
}

// ============================================================================
// Cached Response
// ============================================================================

/// A stored response representation
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
    freshness: Freshness,
}

impl CachedResponse {
    /// Capture a response for storage
    pub fn new(response: &Response, freshness: Freshness) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().clone(),
            stored_at: Instant::now(),
            freshness,
        }
    }

    /// Whether the entry is still within its freshness lifetime
    pub fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.freshness.max_age
    }

    /// Whether the entry carries a validator usable for revalidation
    pub fn has_validator(&self) -> bool {
        self.headers.contains_key(ETAG) || self.headers.contains_key(LAST_MODIFIED)
    }

    /// Add `If-None-Match` / `If-Modified-Since` to a request
    pub fn add_conditional_headers(&self, request: &mut Request) {
        if let Some(etag) = self.headers.get(ETAG) {
            request.headers.insert(IF_NONE_MATCH, etag.clone());
        }
        if let Some(modified) = self.headers.get(LAST_MODIFIED) {
            request.headers.insert(IF_MODIFIED_SINCE, modified.clone());
        }
    }

    /// Renew the entry after a `304 Not Modified`
    ///
    /// Headers sent with the 304 replace the stored ones, except for the
    /// body framing headers which still describe the stored body.
    pub fn revalidated(mut self, not_modified: &Response) -> Self {
        for (name, value) in not_modified.headers() {
            if name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
                continue;
            }
            self.headers.insert(name.clone(), value.clone());
        }
        if let Some(freshness) = Freshness::from_headers(not_modified.headers()) {
            self.freshness = freshness;
        }
        self.stored_at = Instant::now();
        self
    }

    /// Rebuild a response marked as a cache hit
    pub fn to_response(&self) -> Response {
        Response::new(self.status, self.headers.clone(), self.body.clone()).mark_cached()
    }
}

// ============================================================================
// Cache Store
// ============================================================================

/// Storage backend for cached responses
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry (fresh or stale)
    async fn get(&self, key: &CacheKey) -> Option<CachedResponse>;

    /// Insert or replace an entry
    async fn put(&self, key: CacheKey, entry: CachedResponse);

    /// Remove an entry
    async fn remove(&self, key: &CacheKey);

    /// Drop every entry
    async fn clear(&self);

    /// Number of entries held
    async fn len(&self) -> usize;
}

/// In-memory LRU response cache
pub struct MemoryCache {
    entries: Mutex<LruCache<CacheKey, CachedResponse>>,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().await;
        let hit = entries.get(key).cloned();
        trace!(hit = hit.is_some(), "cache lookup");
        hit
    }

    async fn put(&self, key: CacheKey, entry: CachedResponse) {
        let mut entries = self.entries.lock().await;
        if entries.put(key, entry).is_some() {
            trace!("cache entry replaced");
        }
    }

    async fn remove(&self, key: &CacheKey) {
        self.entries.lock().await.pop(key);
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    fn response(pairs: &[(&'static str, &'static str)]) -> Response {
        Response::new(StatusCode::OK, headers(pairs), Bytes::from_static(b"OK"))
    }

    #[test]
    fn test_cache_key_includes_method_and_url() {
        let key = CacheKey::for_request(&Request::get("http://example.com/books?page=2"));
        assert_eq!(key.as_str(), "GET http://example.com/books?page=2");
    }

    #[test]
    fn test_cache_key_header_order_independent() {
        let a = Request::get("http://x/").header("accept", "a").header("x-b", "b");
        let b = Request::get("http://x/").header("x-b", "b").header("accept", "a");
        assert_eq!(CacheKey::for_request(&a), CacheKey::for_request(&b));

        let c = Request::get("http://x/").header("accept", "other");
        assert_ne!(CacheKey::for_request(&a), CacheKey::for_request(&c));
    }

    #[test]
    fn test_freshness_max_age() {
        let f = Freshness::from_headers(&headers(&[("cache-control", "public, max-age=60")]));
        assert_eq!(f, Some(Freshness { max_age: Duration::from_secs(60) }));
    }

    #[test]
    fn test_freshness_subtracts_age() {
        let f = Freshness::from_headers(&headers(&[
            ("cache-control", "max-age=60"),
            ("age", "15"),
        ]));
        assert_eq!(f.unwrap().max_age, Duration::from_secs(45));
    }

    #[test]
    fn test_freshness_no_store() {
        let f = Freshness::from_headers(&headers(&[("cache-control", "max-age=60, no-store")]));
        assert!(f.is_none());
    }

    #[test]
    fn test_freshness_no_cache_is_zero_lifetime() {
        let f = Freshness::from_headers(&headers(&[("cache-control", "no-cache")]));
        assert_eq!(f.unwrap().max_age, Duration::ZERO);
    }

    #[test]
    fn test_freshness_missing_directive() {
        assert!(Freshness::from_headers(&HeaderMap::new()).is_none());
        assert!(Freshness::from_headers(&headers(&[("cache-control", "public")])).is_none());
    }

    #[test]
    fn test_cached_response_marks_hit() {
        let resp = response(&[("cache-control", "max-age=60")]);
        assert!(!resp.from_cache());

        let entry = CachedResponse::new(&resp, Freshness { max_age: Duration::from_secs(60) });
        assert!(entry.is_fresh());
        let replay = entry.to_response();
        assert!(replay.from_cache());
        assert_eq!(replay.text(), "OK");
        assert_eq!(replay.status(), StatusCode::OK);
    }

    #[test]
    fn test_conditional_headers() {
        let resp = response(&[
            ("etag", "\"abc\""),
            ("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        ]);
        let entry = CachedResponse::new(&resp, Freshness { max_age: Duration::ZERO });
        assert!(!entry.is_fresh());
        assert!(entry.has_validator());

        let mut request = Request::get("http://x/");
        entry.add_conditional_headers(&mut request);
        assert_eq!(request.headers.get(IF_NONE_MATCH).unwrap(), "\"abc\"");
        assert_eq!(
            request.headers.get(IF_MODIFIED_SINCE).unwrap(),
            "Wed, 21 Oct 2015 07:28:00 GMT"
        );
    }

    #[test]
    fn test_revalidated_refreshes_lifetime() {
        let entry = CachedResponse::new(
            &response(&[("etag", "\"v1\"")]),
            Freshness { max_age: Duration::ZERO },
        );
        let not_modified = Response::new(
            StatusCode::NOT_MODIFIED,
            headers(&[("cache-control", "max-age=120")]),
            Bytes::new(),
        );
        let renewed = entry.revalidated(&not_modified);
        assert!(renewed.is_fresh());
        assert_eq!(renewed.to_response().text(), "OK");
        assert_eq!(renewed.to_response().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_memory_cache_put_get() {
        let cache = MemoryCache::new(4);
        let key = CacheKey::for_request(&Request::get("http://x/1"));
        assert!(cache.get(&key).await.is_none());

        let entry = CachedResponse::new(
            &response(&[]),
            Freshness { max_age: Duration::from_secs(60) },
        );
        cache.put(key.clone(), entry).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key).await.is_some());

        cache.remove(&key).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_memory_cache_evicts_lru() {
        let cache = MemoryCache::new(2);
        let fresh = Freshness { max_age: Duration::from_secs(60) };
        for i in 0..3 {
            let key = CacheKey::for_request(&Request::get(format!("http://x/{i}")));
            cache.put(key, CachedResponse::new(&response(&[]), fresh)).await;
        }
        assert_eq!(cache.len().await, 2);
        let first = CacheKey::for_request(&Request::get("http://x/0"));
        assert!(cache.get(&first).await.is_none());

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
