/// Task state definitions for tracking crawl progress
///
/// Only `Completed` and `Failed` are ever persisted. `Pending` is the absence
/// of a record and `Running` exists only in memory.
use crate::CrawlError;
use std::fmt;

/// Represents the current state of a task in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Planned but not yet started (or interrupted before finishing)
    Pending,

    /// Currently being crawled
    Running,

    /// Listing, filtering and detail resolution all finished
    Completed,

    /// Gave up after an unrecoverable error; eligible again on the next run
    Failed,
}

impl TaskState {
    /// Returns true if this state ends a task for the current run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if this state is written to the checkpoint
    pub fn is_durable(&self) -> bool {
        self.is_terminal()
    }

    /// Returns true if a task in this state may start running
    ///
    /// Completed tasks are never re-run; failed ones are retried on a later run.
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Failed, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Pending)
        )
    }

    /// Returns `next` if the transition is legal
    pub fn transition(self, next: TaskState) -> Result<TaskState, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn all_states() -> [TaskState; 4] {
        [Self::Pending, Self::Running, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
