//! Configuration module for Reel-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and holds the catalog of category keys the crawler knows how to visit.
//!
//! Every section has defaults, so a crawl can run without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use reel_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reel-harvest.toml")).unwrap();
//! println!("Crawling {}..={}", config.crawl.start_year, config.crawl.end_year);
//! ```

mod catalog;
mod parser;
mod types;
mod validation;

// Re-export types
pub use catalog::{CategoryCatalog, DEFAULT_CATEGORIES, SOUTH_PRIORITY_CATEGORIES};
pub use types::{
    CategoryEntry, Config, CrawlConfig, DetailFailurePolicy, FetchConfig, FilterConfig,
    OutputConfig, RunConfig, DEFAULT_GENRE_KEYWORDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
