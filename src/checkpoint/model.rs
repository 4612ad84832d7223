//! Durable crawl state: records, task outcomes and the detail cache

use crate::config::Config;
use crate::planner::{order_categories, TaskId};
use crate::state::TaskState;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 2;

/// Trims a string and maps blank values to None
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_blank(value))
}

/// Poster, description and genre signals of one detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailInfo {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub poster_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,

    /// Infobox genre entries and page category names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl DetailInfo {
    pub fn new(poster_url: Option<String>, description: Option<String>, genres: Vec<String>) -> Self {
        Self {
            poster_url: non_blank(poster_url),
            description: non_blank(description),
            genres: genres
                .into_iter()
                .filter_map(|g| non_blank(Some(g)))
                .collect(),
        }
    }
}

/// One film in the output dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub year: i32,

    #[serde(alias = "language")]
    pub category_key: String,

    pub title: String,

    #[serde(alias = "movie_page_url")]
    pub detail_url: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub poster_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,

    /// Listing page the title was found on
    pub source_url: String,
}

impl Record {
    pub fn task_id(&self) -> TaskId {
        TaskId::new(self.year, &self.category_key)
    }

    /// Identity used for de-duplication: `(task id, detail url)`
    pub fn key(&self) -> (TaskId, String) {
        (self.task_id(), self.detail_url.clone())
    }
}

/// The configuration a checkpoint was created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(alias = "languages")]
    pub category_keys: Vec<String>,
}

impl CheckpointConfig {
    /// Extracts the fields that identify a crawl from the full configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_year: config.crawl.start_year,
            end_year: config.crawl.end_year,
            category_keys: order_categories(&config.crawl.categories, false),
        }
    }
}

impl fmt::Display for CheckpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "years {}..={} categories [{}]",
            self.start_year,
            self.end_year,
            self.category_keys.join(", ")
        )
    }
}

/// Result of merging externally supplied records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub skipped: usize,
}

/// Durable snapshot of crawl progress
///
/// Invariants maintained by the mutation methods:
/// - a task id is in at most one of `completed_tasks` and `failed_tasks`
/// - no two records share a `(task id, detail url)` pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointState {
    pub version: u32,
    pub config: CheckpointConfig,
    pub completed_tasks: BTreeSet<TaskId>,
    pub failed_tasks: BTreeMap<TaskId, String>,
    pub records: Vec<Record>,
    pub detail_cache: BTreeMap<String, DetailInfo>,
}

impl Default for CheckpointState {
    fn default() -> Self {
        Self::new(CheckpointConfig {
            start_year: 0,
            end_year: 0,
            category_keys: Vec::new(),
        })
    }
}

impl CheckpointState {
    pub fn new(config: CheckpointConfig) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            config,
            completed_tasks: BTreeSet::new(),
            failed_tasks: BTreeMap::new(),
            records: Vec::new(),
            detail_cache: BTreeMap::new(),
        }
    }

    /// Durable state of a task: completed, failed, or pending
    pub fn durable_state(&self, id: &TaskId) -> TaskState {
        if self.completed_tasks.contains(id) {
            TaskState::Completed
        } else if self.failed_tasks.contains_key(id) {
            TaskState::Failed
        } else {
            TaskState::Pending
        }
    }

    /// Records a finished task together with its records
    ///
    /// Any earlier failure for the task is cleared. Records that duplicate an
    /// existing `(task id, detail url)` are dropped.
    pub fn mark_completed(&mut self, id: &TaskId, records: Vec<Record>) -> MergeOutcome {
        self.failed_tasks.remove(id);
        self.completed_tasks.insert(id.clone());
        self.append_unique(records)
    }

    /// Records a task failure with its last error message
    pub fn mark_failed(&mut self, id: &TaskId, message: impl Into<String>) {
        self.completed_tasks.remove(id);
        self.failed_tasks.insert(id.clone(), message.into());
    }

    /// Marks a task as complete without crawling it
    ///
    /// Returns true if the task was previously recorded as failed.
    pub fn mark_task_complete_manually(&mut self, id: &TaskId) -> bool {
        let was_failed = self.failed_tasks.remove(id).is_some();
        self.completed_tasks.insert(id.clone());
        was_failed
    }

    /// Appends externally supplied records, skipping duplicates
    pub fn merge_manual_records(&mut self, records: Vec<Record>) -> MergeOutcome {
        self.append_unique(records)
    }

    /// Returns true if the configuration identifies the same crawl
    pub fn matches_config(&self, config: &CheckpointConfig) -> bool {
        &self.config == config
    }

    fn append_unique(&mut self, records: Vec<Record>) -> MergeOutcome {
        let mut seen: HashSet<(TaskId, String)> = self.records.iter().map(Record::key).collect();
        let mut outcome = MergeOutcome::default();

        for record in records {
            if seen.insert(record.key()) {
                self.records.push(record);
                outcome.added += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        outcome
    }
}

/// On-disk layout accepted when loading, including version 1 checkpoints
#[derive(Debug, Deserialize)]
pub(crate) struct RawCheckpoint {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub config: CheckpointConfig,
    #[serde(default)]
    pub completed_tasks: BTreeSet<TaskId>,
    #[serde(default)]
    pub failed_tasks: BTreeMap<TaskId, String>,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, alias = "movie_details_cache")]
    pub detail_cache: Option<BTreeMap<String, DetailInfo>>,
    /// Oldest checkpoints only stored poster URLs
    #[serde(default)]
    pub poster_cache: BTreeMap<String, String>,
}

fn legacy_version() -> u32 {
    1
}

impl RawCheckpoint {
    /// Upgrades any accepted layout to the current version
    pub(crate) fn into_state(self) -> CheckpointState {
        let detail_cache = self.detail_cache.unwrap_or_else(|| {
            self.poster_cache
                .into_iter()
                .map(|(url, poster)| (url, DetailInfo::new(Some(poster), None, Vec::new())))
                .collect()
        });

        let mut state = CheckpointState::new(self.config);
        state.completed_tasks = self.completed_tasks;
        state.failed_tasks = self.failed_tasks;
        state.detail_cache = detail_cache;

        // a completed id wins over a stale failure entry
        let completed = state.completed_tasks.clone();
        state.failed_tasks.retain(|id, _| !completed.contains(id));

        state.append_unique(self.records);
        state
    }
}
