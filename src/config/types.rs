use crate::config::catalog::{CategoryCatalog, DEFAULT_CATEGORIES};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Description keywords that signal a horror title
pub const DEFAULT_GENRE_KEYWORDS: [&str; 21] = [
    "horror",
    "supernatural",
    "ghost",
    "ghosts",
    "haunted",
    "haunting",
    "paranormal",
    "possession",
    "possessed",
    "exorcism",
    "exorcist",
    "demon",
    "demonic",
    "zombie",
    "vampire",
    "slasher",
    "occult",
    "black magic",
    "witchcraft",
    "evil spirit",
    "spirits",
];

/// Main configuration structure for Reel-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub fetch: FetchConfig,
    pub run: RunConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
    /// Extra or overriding category templates
    #[serde(rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

impl Config {
    /// Category catalog with the configured entries applied
    pub fn catalog(&self) -> CategoryCatalog {
        CategoryCatalog::with_entries(&self.categories)
    }
}

/// What to crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// First year to crawl
    pub start_year: i32,

    /// Last year to crawl, inclusive
    pub end_year: i32,

    /// Category keys in their configured order
    pub categories: Vec<String>,

    /// Crawl the south Indian categories before the rest
    pub south_first: bool,

    /// Root of the wiki, e.g. `https://en.wikipedia.org`
    pub base_url: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_year: 2000,
            end_year: 2015,
            categories: DEFAULT_CATEGORIES.iter().map(|k| k.to_string()).collect(),
            south_first: true,
            base_url: "https://en.wikipedia.org".to_string(),
        }
    }
}

/// HTTP behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Size of the detail page worker pool
    pub workers: usize,

    /// Minimum time between any two outbound requests (milliseconds)
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Attempts per page, including the first
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    pub backoff_base_ms: u64,

    /// Cap on the retry delay (milliseconds)
    pub backoff_max_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl FetchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_delay_ms: 500,
            timeout_secs: 20,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 16_000,
            user_agent: concat!(
                "reel-harvest/",
                env!("CARGO_PKG_VERSION"),
                " (+https://github.com/reel-harvest/reel-harvest)"
            )
            .to_string(),
        }
    }
}

/// What to do when a detail page cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailFailurePolicy {
    /// Keep going; confirmed titles get a record with no poster or description
    #[default]
    Tolerate,

    /// Any detail failure fails the whole task
    FailTask,
}

/// Run control configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Stop after this many tasks complete in one run (0 = never)
    pub pause_after: usize,

    /// How long in-flight detail fetches may run after an interrupt (seconds)
    pub grace_period_secs: u64,

    pub detail_failure: DetailFailurePolicy,

    /// Only re-run tasks that are currently recorded as failed
    pub failed_only: bool,
}

impl RunConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pause_after: 0,
            grace_period_secs: 10,
            detail_failure: DetailFailurePolicy::Tolerate,
            failed_only: false,
        }
    }
}

/// Genre filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Genre token looked for in listing labels and infobox genres
    pub genre: String,

    /// Words or phrases that mark a description as in-genre
    pub keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            genre: "horror".to_string(),
            keywords: DEFAULT_GENRE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON checkpoint file
    pub checkpoint_path: PathBuf,

    /// Path to the CSV dataset; a JSON copy is written next to it
    pub dataset_path: PathBuf,

    /// Path to the CSV report of failed tasks
    pub failure_report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("indian_movies_scrape_progress.json"),
            dataset_path: PathBuf::from("indian_horror_movies.csv"),
            failure_report_path: PathBuf::from("indian_movies_failed_tasks.csv"),
        }
    }
}

/// A configured category template
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Category key used in task ids
    pub key: String,

    /// Page title template, `{year}` is substituted
    pub template: String,
}
