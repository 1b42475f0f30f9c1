//! HTTP client with rate limiting, retry and response caching
//!
//! Every outbound read goes through [`HttpClient::execute`], which:
//! - waits for the shared rate limiter to admit the request
//! - serves fresh cached representations without touching the network
//! - retries transport failures and retry-eligible statuses with backoff
//! - stores cacheable `200` responses for later calls
//!
//! All waits run under the caller's [`RequestContext`]; cancellation or an
//! expired deadline aborts immediately and is never retried.

use super::cache::{CacheKey, CacheStore, CachedResponse, Freshness, MemoryCache};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::request::{Request, Response};
use super::retry::{extract_retry_after, Attempt, RetryCheck, RetryPolicy};
use crate::context::RequestContext;
use crate::error::{Error, ErrorKind, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const EXECUTE_OP: &str = "http.execute";

/// Configuration for the HTTP client
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Rate limiter configuration, `None` disables admission control
    pub rate_limit: Option<RateLimiterConfig>,
    /// Retry bounds and predicate
    pub retry: RetryPolicy,
    /// Response cache, `None` disables caching
    pub cache: Option<Arc<dyn CacheStore>>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            rate_limit: Some(RateLimiterConfig::default()),
            retry: RetryPolicy::default(),
            cache: Some(Arc::new(MemoryCache::default())),
            default_headers: HashMap::new(),
            user_agent: format!("gutendex-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .field("has_cache", &self.cache.is_some())
            .field("default_headers", &self.default_headers)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set max retries after the first attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.set_max_retries(retries);
        self
    }

    /// Set backoff bounds (given in either order)
    pub fn retry_wait(mut self, min: Duration, max: Duration) -> Self {
        self.config.retry.set_wait(min, max);
        self
    }

    /// Replace the retry predicate
    pub fn retry_check(mut self, check: impl RetryCheck + 'static) -> Self {
        self.config.retry.set_check(Arc::new(check));
        self
    }

    /// Replace the whole retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Use a specific cache store
    pub fn cache(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.config.cache = Some(store);
        self
    }

    /// Disable response caching
    pub fn no_cache(mut self) -> Self {
        self.config.cache = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry, rate limiting and caching
///
/// One instance is meant to be shared (behind an `Arc`) by every caller
/// of the same API; the limiter and cache are synchronized internally.
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Response cache, if enabled
    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.config.cache.as_ref()
    }

    /// Execute one read request
    ///
    /// The final response is returned as received, whatever its status;
    /// only a transport failure that outlives the retries becomes a
    /// `Network` error. Cancellation surfaces as [`Error::Cancelled`] or
    /// [`Error::DeadlineExceeded`].
    pub async fn execute(&self, ctx: &RequestContext, request: &Request) -> Result<Response> {
        if let Err(e) = url::Url::parse(&request.url) {
            return Err(Error::request(EXECUTE_OP, ErrorKind::Network, e));
        }

        match &self.rate_limiter {
            Some(limiter) => limiter.acquire(ctx).await?,
            None => ctx.check()?,
        }

        let Some(cache) = &self.config.cache else {
            return self.send_with_retry(ctx, request).await;
        };

        let key = CacheKey::for_request(request);
        let mut stale = None;
        let mut outbound = request.clone();

        if let Some(entry) = cache.get(&key).await {
            if entry.is_fresh() {
                debug!(url = %request.url, "served from cache");
                return Ok(entry.to_response());
            }
            if entry.has_validator() {
                entry.add_conditional_headers(&mut outbound);
                stale = Some(entry);
            }
        }

        let response = self.send_with_retry(ctx, &outbound).await?;
        Ok(store_response(&**cache, key, stale, response).await)
    }

    /// Execute a GET and decode a JSON body, classifying failures
    ///
    /// `op` labels any error produced. Both single-resource fetches and
    /// page fetches use this path, so they share one status mapping.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        op: &str,
        url: &str,
    ) -> Result<T> {
        let response = self
            .execute(ctx, &Request::get(url))
            .await
            .map_err(|e| relabel(op, e))?;
        classify_response(op, &response)?;
        response
            .json()
            .map_err(|e| Error::request(op, ErrorKind::Server, e))
    }

    async fn send_with_retry(&self, ctx: &RequestContext, request: &Request) -> Result<Response> {
        let retry = &self.config.retry;
        let max_attempts = retry.max_retries().saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            let delay = match ctx.run(self.send_once(request)).await? {
                Ok(response) => {
                    let status = response.status();
                    if !retry.should_retry(attempt, Attempt::Response(status)) {
                        debug!(
                            "Request finished: {} {} -> {}",
                            request.method,
                            request.url,
                            status.as_u16()
                        );
                        return Ok(response);
                    }

                    let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                        extract_retry_after(response.headers())
                            .map_or_else(|| retry.backoff(attempt), |d| retry.retry_after(d))
                    } else {
                        retry.backoff(attempt)
                    };
                    warn!(
                        "Request returned {}, attempt {}/{}, retrying in {:?}",
                        status.as_u16(),
                        attempt + 1,
                        max_attempts,
                        delay
                    );
                    delay
                }
                Err(e) => {
                    if !retry.should_retry(attempt, Attempt::Failed(&e)) {
                        return Err(Error::request(EXECUTE_OP, ErrorKind::Network, e));
                    }
                    let delay = retry.backoff(attempt);
                    warn!(
                        "Request failed: {}, attempt {}/{}, retrying in {:?}",
                        e,
                        attempt + 1,
                        max_attempts,
                        delay
                    );
                    delay
                }
            };

            ctx.sleep(delay).await?;
            attempt += 1;
        }
    }

    async fn send_once(&self, request: &Request) -> std::result::Result<Response, reqwest::Error> {
        let mut req = self.client.request(request.method.clone(), &request.url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Response::new(status, headers, body))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Update the cache from a fresh network response
async fn store_response(
    cache: &dyn CacheStore,
    key: CacheKey,
    stale: Option<CachedResponse>,
    response: Response,
) -> Response {
    match (response.status(), stale) {
        (StatusCode::NOT_MODIFIED, Some(entry)) => {
            let renewed = entry.revalidated(&response);
            let replay = renewed.to_response();
            cache.put(key, renewed).await;
            debug!("revalidated cache entry");
            replay
        }
        (StatusCode::OK, _) => {
            match Freshness::from_headers(response.headers()) {
                Some(freshness) => {
                    cache
                        .put(key, CachedResponse::new(&response, freshness))
                        .await;
                    debug!(max_age = ?freshness.max_age, "stored response in cache");
                }
                None => cache.remove(&key).await,
            }
            response
        }
        _ => response,
    }
}

/// Map a non-success status to a classified error
pub fn classify_response(op: &str, response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::status(op, status.as_u16()))
    }
}

fn relabel(op: &str, err: Error) -> Error {
    match err {
        Error::Request { kind, source, .. } => Error::Request {
            op: op.to_string(),
            kind,
            source,
        },
        other => other,
    }
}
