//! Crawler module for fetching and processing wiki pages
//!
//! This module contains the core crawling logic, including:
//! - The page transport and its error classification
//! - Rate limiting and retry with backoff
//! - Category listing and film page parsing
//! - The shared detail cache and its worker pool
//! - Overall run coordination

mod category;
mod coordinator;
mod detail;
mod fetcher;
mod parser;
mod rate_limiter;
mod retry;
mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use category::{CategoryFetcher, ListedEntity};
pub use coordinator::{run_crawl, Coordinator, RunOutcome};
pub use detail::{DetailCache, DetailError, DetailFetcher};
pub use fetcher::PageFetcher;
pub use parser::{parse_category_page, parse_detail_page, CandidateEntity, CategoryPage};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryDecision, RetryPolicy};
pub use source::{build_http_client, FetchError, HttpPageSource, PageSource};
