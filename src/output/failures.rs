//! Failed task report

use crate::checkpoint::CheckpointState;
use crate::output::OutputError;
use std::fs;
use std::path::Path;

/// Writes one `task_id,error` row per failed task, in task id order
///
/// The header is always written, so an empty report means no failures.
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written
/// * `Err(OutputError)` - The file could not be written
pub fn write_failure_report(state: &CheckpointState, path: &Path) -> Result<usize, OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| OutputError::csv(path, e))?;
    writer
        .write_record(["task_id", "error"])
        .map_err(|e| OutputError::csv(path, e))?;

    for (task_id, error) in &state.failed_tasks {
        writer
            .write_record([task_id.as_str(), error.as_str()])
            .map_err(|e| OutputError::csv(path, e))?;
    }
    writer.flush().map_err(|e| OutputError::io(path, e))?;

    if !state.failed_tasks.is_empty() {
        tracing::info!(
            "Wrote {} failed tasks to {}",
            state.failed_tasks.len(),
            path.display()
        );
    }

    Ok(state.failed_tasks.len())
}
