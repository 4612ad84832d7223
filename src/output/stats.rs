//! Run statistics
//!
//! This module provides the summary printed at the end of every crawl.

use crate::crawler::RunOutcome;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::path::PathBuf;

/// Task counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Tasks produced by the planner
    pub planned: usize,

    /// Tasks not eligible in this run (already completed, or not failed in
    /// failed-only mode)
    pub skipped: usize,

    pub completed: usize,
    pub failed: usize,

    /// Eligible tasks left untouched because the run paused or was cancelled
    pub remaining: usize,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: TaskCounts,

    /// Records appended to the checkpoint during this run
    pub records_added: usize,

    /// Records in the checkpoint after this run
    pub records_total: usize,

    /// Resolved film pages in the detail cache
    pub cache_size: usize,

    /// Film page fetches started during this run
    pub detail_fetches: usize,

    pub checkpoint_path: PathBuf,
    pub dataset_path: PathBuf,
    pub failure_report_path: PathBuf,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

/// Formats the summary as plain text
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let counts = &summary.counts;

    // writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Run {} in {}s", summary.outcome, summary.duration_seconds());
    let _ = writeln!(out, "  Started:  {}", summary.started_at.to_rfc3339());
    let _ = writeln!(out, "  Finished: {}", summary.finished_at.to_rfc3339());
    let _ = writeln!(out);

    let _ = writeln!(out, "Tasks:");
    let _ = writeln!(out, "  Planned:   {}", counts.planned);
    let _ = writeln!(out, "  Skipped:   {}", counts.skipped);
    let _ = writeln!(out, "  Completed: {}", counts.completed);
    let _ = writeln!(out, "  Failed:    {}", counts.failed);
    let _ = writeln!(out, "  Remaining: {}", counts.remaining);
    let _ = writeln!(out);

    let _ = writeln!(out, "Records:");
    let _ = writeln!(out, "  Added this run: {}", summary.records_added);
    let _ = writeln!(out, "  Total:          {}", summary.records_total);
    let _ = writeln!(
        out,
        "  Detail cache:   {} pages ({} fetched this run)",
        summary.cache_size, summary.detail_fetches
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Files:");
    let _ = writeln!(out, "  Checkpoint:     {}", summary.checkpoint_path.display());
    let _ = writeln!(out, "  Dataset:        {}", summary.dataset_path.display());
    let _ = writeln!(out, "  Failure report: {}", summary.failure_report_path.display());

    if summary.outcome != RunOutcome::Finished {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Resume with: reel-harvest --resume --checkpoint {}",
            summary.checkpoint_path.display()
        );
    }

    if counts.failed > 0 {
        let _ = writeln!(
            out,
            "Retry failed tasks with: reel-harvest --resume --failed-only --checkpoint {}",
            summary.checkpoint_path.display()
        );
    }

    out
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary(outcome: RunOutcome, failed: usize) -> RunSummary {
        let started_at = Utc::now();
        RunSummary {
            outcome,
            started_at,
            finished_at: started_at + Duration::seconds(42),
            counts: TaskCounts {
                planned: 10,
                skipped: 4,
                completed: 3,
                failed,
                remaining: 3 - failed,
            },
            records_added: 7,
            records_total: 19,
            cache_size: 25,
            detail_fetches: 11,
            checkpoint_path: PathBuf::from("progress.json"),
            dataset_path: PathBuf::from("movies.csv"),
            failure_report_path: PathBuf::from("failed.csv"),
        }
    }

    #[test]
    fn test_duration() {
        assert_eq!(summary(RunOutcome::Finished, 0).duration_seconds(), 42);
    }

    #[test]
    fn test_format_contains_counts_and_paths() {
        let text = format_summary(&summary(RunOutcome::Finished, 0));
        assert!(text.contains("Run finished in 42s"));
        assert!(text.contains("Planned:   10"));
        assert!(text.contains("Added this run: 7"));
        assert!(text.contains("25 pages (11 fetched this run)"));
        assert!(text.contains("Dataset:        movies.csv"));
        assert!(!text.contains("Resume with"));
    }

    #[test]
    fn test_resume_hint_when_paused() {
        let text = format_summary(&summary(RunOutcome::Paused, 0));
        assert!(text.contains("Resume with: reel-harvest --resume --checkpoint progress.json"));
    }

    #[test]
    fn test_failed_only_hint() {
        let text = format_summary(&summary(RunOutcome::Finished, 2));
        assert!(text.contains("--failed-only"));
    }
}
