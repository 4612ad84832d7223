//! Reel-Harvest: a resumable genre crawler for Indian cinema
//!
//! This crate crawls wiki-style category listings of Indian films per year and
//! language, keeps the titles that belong to a target genre, and resolves a
//! poster and description for each. Progress is checkpointed after every task
//! so that long crawls survive interruption.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod planner;
pub mod state;

use thiserror::Error;

/// Main error type for Reel-Harvest operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Planner emitted task {0} more than once")]
    DuplicateTask(String),

    #[error("Invalid task id '{0}' (expected YEAR:CATEGORY)")]
    InvalidTaskId(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TaskState,
        to: state::TaskState,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Task interrupted by cancellation")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if this error should be retried by the fetch components
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown category key: {0}")]
    UnknownCategory(String),
}

/// Result type alias for Reel-Harvest operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::{CheckpointState, DetailInfo, Record};
pub use config::Config;
pub use planner::{plan_tasks, Task, TaskId};
pub use state::TaskState;
