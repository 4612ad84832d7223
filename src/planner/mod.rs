//! Task planning
//!
//! Turns the configured year range and category keys into a deterministic,
//! totally ordered list of tasks. Resumed runs rely on this order being stable
//! for identical configuration, so the convention is fixed:
//!
//! - category keys are deduplicated, first occurrence wins
//! - with south-first enabled, the selected priority categories
//!   (tamil, telugu, malayalam, kannada) come first in their configured order,
//!   followed by the remaining keys in configured order
//! - categories are iterated outer, years inner in ascending order
//!
//! # Example
//!
//! ```
//! use reel_harvest::config::Config;
//! use reel_harvest::planner::plan_tasks;
//!
//! let mut config = Config::default();
//! config.crawl.start_year = 2000;
//! config.crawl.end_year = 2001;
//! config.crawl.categories = vec!["hindi".into(), "tamil".into()];
//!
//! let ids: Vec<String> = plan_tasks(&config)
//!     .unwrap()
//!     .iter()
//!     .map(|t| t.id().to_string())
//!     .collect();
//! assert_eq!(ids, ["2000:tamil", "2001:tamil", "2000:hindi", "2001:hindi"]);
//! ```

mod task;

pub use task::{Task, TaskId};

use crate::config::{Config, SOUTH_PRIORITY_CATEGORIES};
use crate::{ConfigError, CrawlError};
use std::collections::HashSet;

/// Orders category keys according to the south-first policy
///
/// The sort is stable, so keys within each group keep their configured order.
pub fn order_categories(categories: &[String], south_first: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered: Vec<String> = categories
        .iter()
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect();

    if south_first {
        ordered.sort_by_key(|key| !SOUTH_PRIORITY_CATEGORIES.contains(&key.as_str()));
    }

    ordered
}

/// Plans the full ordered task list for a configuration
///
/// # Returns
///
/// * `Ok(Vec<Task>)` - Tasks in execution order
/// * `Err(CrawlError::Config)` - A category key has no template
/// * `Err(CrawlError::DuplicateTask)` - Two tasks share an id
pub fn plan_tasks(config: &Config) -> Result<Vec<Task>, CrawlError> {
    let catalog = config.catalog();
    let crawl = &config.crawl;
    let mut tasks = Vec::new();

    for key in order_categories(&crawl.categories, crawl.south_first) {
        for year in crawl.start_year..=crawl.end_year {
            let source_url = catalog
                .source_url(&crawl.base_url, &key, year)
                .ok_or_else(|| ConfigError::UnknownCategory(key.clone()))?;

            tasks.push(Task {
                year,
                category_key: key.clone(),
                source_url,
            });
        }
    }

    ensure_unique(&tasks)?;

    Ok(tasks)
}

fn ensure_unique(tasks: &[Task]) -> Result<(), CrawlError> {
    let mut ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        let id = task.id();
        if !ids.insert(id.clone()) {
            return Err(CrawlError::DuplicateTask(id.to_string()));
        }
    }
    Ok(())
}
