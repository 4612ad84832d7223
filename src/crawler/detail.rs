//! Film page resolution with a shared, single-flight cache
//!
//! The cache is shared by every detail worker and every task of a run. Each
//! URL owns one `OnceCell` slot, so concurrent requests for the same page
//! wait on a single fetch. Failures stay in their slot for the rest of the run
//! but are never written to the checkpoint, so a later run retries them.

use crate::checkpoint::DetailInfo;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::parse_detail_page;
use crate::crawler::FetchError;
use crate::CrawlError;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::OnceCell;

/// Why a film page could not be resolved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetailError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl From<DetailError> for CrawlError {
    fn from(error: DetailError) -> Self {
        match error {
            DetailError::Fetch(e) => CrawlError::Fetch(e),
            DetailError::Parse { url, message } => CrawlError::Parse { url, message },
        }
    }
}

type Slot = Arc<OnceCell<Result<DetailInfo, DetailError>>>;

/// Detail cache keyed by film page URL
#[derive(Debug, Default)]
pub struct DetailCache {
    slots: Mutex<HashMap<String, Slot>>,
    fetches: AtomicUsize,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-filled with entries from a checkpoint
    pub fn seeded(entries: &BTreeMap<String, DetailInfo>) -> Self {
        let slots = entries
            .iter()
            .map(|(url, info)| {
                let slot = Arc::new(OnceCell::new_with(Some(Ok(info.clone()))));
                (url.clone(), slot)
            })
            .collect();

        Self {
            slots: Mutex::new(slots),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Returns the cached result for `url`, running `fetch` on a miss
    ///
    /// Only one caller per URL runs `fetch`; the others wait for its result.
    pub async fn get_or_fetch<F, Fut>(&self, url: &str, fetch: F) -> Result<DetailInfo, DetailError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<DetailInfo, DetailError>>,
    {
        let slot = self.slot(url);
        slot.get_or_init(|| {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            fetch()
        })
        .await
        .clone()
    }

    /// Successfully resolved entry for `url`, if any
    pub fn get(&self, url: &str) -> Option<DetailInfo> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(url)
            .and_then(|slot| slot.get())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// All successful entries, for persisting into the checkpoint
    pub fn snapshot(&self) -> BTreeMap<String, DetailInfo> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .iter()
            .filter_map(|(url, slot)| match slot.get() {
                Some(Ok(info)) => Some((url.clone(), info.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of successfully resolved pages
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches started through this cache
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn slot(&self, url: &str) -> Slot {
        // never held across an await
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(url.to_string()).or_default())
    }
}

/// Resolves film pages through the shared cache
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    fetcher: PageFetcher,
    cache: Arc<DetailCache>,
}

impl DetailFetcher {
    pub fn new(fetcher: PageFetcher, cache: Arc<DetailCache>) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &Arc<DetailCache> {
        &self.cache
    }

    /// Returns the poster, description and genres of a film page
    ///
    /// Cached results (including failures from earlier in this run) are
    /// returned without touching the network.
    pub async fn resolve(&self, url: &str) -> Result<DetailInfo, DetailError> {
        self.cache
            .get_or_fetch(url, || async {
                tracing::debug!("Fetching details: {}", url);
                let body = self.fetcher.fetch_with_retry(url).await?;
                parse_detail_page(&body, url).map_err(|e| match e {
                    CrawlError::Parse { url, message } => DetailError::Parse { url, message },
                    other => DetailError::Parse {
                        url: url.to_string(),
                        message: other.to_string(),
                    },
                })
            })
            .await
    }
}
