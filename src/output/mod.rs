//! Output module for exporting results and reporting on runs
//!
//! This module handles:
//! - Exporting the dataset as CSV and JSON
//! - Writing the failed task report
//! - Reading manually prepared records
//! - Summarizing a crawl run

mod dataset;
mod failures;
mod import;
pub mod stats;

pub use dataset::{export_dataset, json_sibling, sorted_records, DATASET_COLUMNS};
pub use failures::write_failure_report;
pub use import::read_manual_records;
pub use stats::{format_summary, print_summary, RunSummary, TaskCounts};

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading or writing output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid row at line {line} of {path}: {message}")]
    InvalidRow {
        path: String,
        line: usize,
        message: String,
    },
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}
