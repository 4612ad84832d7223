//! Task and task id types

use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a task: `"{year}:{category_key}"`
///
/// This is the key under which progress is stored in the checkpoint, so its
/// textual form must never change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(year: i32, category_key: &str) -> Self {
        Self(format!("{}:{}", year, category_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Year part of the id
    pub fn year(&self) -> Option<i32> {
        self.0.split_once(':').and_then(|(year, _)| year.parse().ok())
    }

    /// Category part of the id
    pub fn category_key(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, key)| key)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = CrawlError;

    /// Parses and validates a `YEAR:CATEGORY` id, e.g. from the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, key) = s
            .split_once(':')
            .ok_or_else(|| CrawlError::InvalidTaskId(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| CrawlError::InvalidTaskId(s.to_string()))?;

        if key.is_empty() || key.contains(':') {
            return Err(CrawlError::InvalidTaskId(s.to_string()));
        }

        Ok(Self::new(year, key))
    }
}

/// One unit of crawl work: the listing of one category for one year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub year: i32,
    pub category_key: String,
    /// First listing page of the category
    pub source_url: String,
}

impl Task {
    pub fn id(&self) -> TaskId {
        TaskId::new(self.year, &self.category_key)
    }
}
