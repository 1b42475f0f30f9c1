//! HTTP client module
//!
//! Provides the guarded HTTP path every request goes through.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor, shared by all callers
//! - **Automatic Retries**: Replaceable retry predicate with linear jittered backoff
//! - **Response Caching**: In-memory LRU cache honoring `Cache-Control` and validators
//! - **Cancellation**: Every wait runs under the caller's
//!   [`RequestContext`](crate::context::RequestContext)

mod cache;
mod client;
mod rate_limit;
mod request;
mod retry;

pub use cache::{
    CacheKey, CacheStore, CachedResponse, Freshness, MemoryCache, DEFAULT_CACHE_CAPACITY,
};
pub use client::{classify_response, HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{Request, Response, CACHE_HIT_HEADER};
pub use retry::{
    extract_retry_after, is_retryable_status, Attempt, DefaultRetryCheck, NeverRetry, RetryCheck,
    RetryPolicy,
};
