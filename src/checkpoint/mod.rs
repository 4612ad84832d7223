//! Checkpoint module for persisting crawl progress
//!
//! This module handles:
//! - The durable state model (records, task outcomes, detail cache)
//! - Atomic JSON persistence and loading, including older formats
//! - Manual recovery operations (record import, manual task completion)

mod model;
mod store;

pub use model::{
    CheckpointConfig, CheckpointState, DetailInfo, MergeOutcome, Record, CHECKPOINT_VERSION,
};
pub use store::CheckpointStore;

pub(crate) use model::non_blank;

use thiserror::Error;

/// Errors that can occur while loading or saving checkpoints
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint {path} is corrupt and was left untouched: {message}")]
    Corrupt { path: String, message: String },

    #[error("Checkpoint {path} has unsupported version {version}")]
    UnsupportedVersion { path: String, version: u32 },

    #[error("Checkpoint was created for {found}, but the current configuration is {expected}. Use matching options or start with --fresh")]
    ConfigMismatch { expected: String, found: String },

    #[error("Checkpoint {path} not found")]
    NotFound { path: String },

    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}
