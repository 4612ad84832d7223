//! Rate-limited, retrying page fetcher
//!
//! Both the category fetcher and the detail workers go through one shared
//! [`PageFetcher`], so the rate limit and retry policy apply to every request
//! the process makes.

use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::{RetryDecision, RetryPolicy};
use crate::crawler::{FetchError, PageSource};
use std::sync::Arc;

/// Page source wrapped with rate limiting and retries
#[derive(Clone)]
pub struct PageFetcher {
    source: Arc<dyn PageSource>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn PageSource>, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            source,
            limiter,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a page, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page body
    /// * `Err(FetchError)` - The last error once retries are exhausted, or the
    ///   first permanent error
    pub async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;

        loop {
            self.limiter.acquire().await;

            let error = match self.source.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            match self.policy.should_retry(&error, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.policy.max_attempts(),
                        url,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::GiveUp => {
                    tracing::debug!("Giving up on {} after {} attempt(s): {}", url, attempt, error);
                    return Err(error);
                }
            }
        }
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
