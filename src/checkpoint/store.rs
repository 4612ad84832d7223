//! JSON file storage for checkpoint state
//!
//! Saves are atomic: the state is written to a sibling temporary file, synced,
//! and renamed over the checkpoint. A crash or error at any point before the
//! rename leaves the previous checkpoint untouched.

use crate::checkpoint::model::{CheckpointConfig, CheckpointState, RawCheckpoint, CHECKPOINT_VERSION};
use crate::checkpoint::CheckpointError;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Owner of the checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a checkpoint file is present
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Some(state))` - The file existed and was parsed (older versions are upgraded)
    /// * `Ok(None)` - No file
    /// * `Err(CheckpointError::Corrupt)` - The file exists but is empty or cannot be parsed
    /// * `Err(CheckpointError::UnsupportedVersion)` - Written by a newer format
    pub fn load(&self) -> Result<Option<CheckpointState>, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Err(CheckpointError::Corrupt {
                path: self.path.display().to_string(),
                message: "file is empty".to_string(),
            });
        }

        let raw: RawCheckpoint =
            serde_json::from_str(&content).map_err(|e| CheckpointError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        if raw.version > CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                path: self.path.display().to_string(),
                version: raw.version,
            });
        }

        if raw.version < CHECKPOINT_VERSION {
            tracing::info!(
                "Upgrading checkpoint {} from version {} to {}",
                self.path.display(),
                raw.version,
                CHECKPOINT_VERSION
            );
        }

        Ok(Some(raw.into_state()))
    }

    /// Loads the checkpoint, or creates an empty state for `config` if absent
    pub fn load_or_new(&self, config: &CheckpointConfig) -> Result<CheckpointState, CheckpointError> {
        Ok(self
            .load()?
            .unwrap_or_else(|| CheckpointState::new(config.clone())))
    }

    /// Loads the checkpoint for a resumed crawl and checks it belongs to `config`
    pub fn load_for_resume(
        &self,
        config: &CheckpointConfig,
    ) -> Result<CheckpointState, CheckpointError> {
        let state = self.load_or_new(config)?;
        if !state.matches_config(config) {
            return Err(CheckpointError::ConfigMismatch {
                expected: config.to_string(),
                found: state.config.to_string(),
            });
        }
        Ok(state)
    }

    /// Loads the checkpoint, failing if there is none
    pub fn load_existing(&self) -> Result<CheckpointState, CheckpointError> {
        self.load()?.ok_or_else(|| CheckpointError::NotFound {
            path: self.path.display().to_string(),
        })
    }

    /// Atomically writes the state to the checkpoint file
    pub fn save(&self, state: &CheckpointState) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = temp_path_for(&self.path);
        let written = write_synced(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &self.path));

        if let Err(e) = written {
            // the old checkpoint is still in place; only the temp file may be left over
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        tracing::debug!(
            "Saved checkpoint {} ({} records, {} completed, {} failed)",
            self.path.display(),
            state.records.len(),
            state.completed_tasks.len(),
            state.failed_tasks.len()
        );

        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Temporary sibling used while saving `path`
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkpoint".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
