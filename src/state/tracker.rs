//! Per-run view of task states

use crate::checkpoint::CheckpointState;
use crate::planner::{Task, TaskId};
use crate::state::TaskState;
use crate::CrawlError;
use std::collections::HashMap;

/// Tracks the state of every planned task during one run
///
/// Seeded from the durable checkpoint: completed and failed ids keep their
/// state, everything else starts as pending.
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    states: HashMap<TaskId, TaskState>,
}

impl TaskTracker {
    pub fn from_checkpoint(tasks: &[Task], checkpoint: &CheckpointState) -> Self {
        let states = tasks
            .iter()
            .map(|task| {
                let id = task.id();
                let state = checkpoint.durable_state(&id);
                (id, state)
            })
            .collect();
        Self { states }
    }

    /// Returns the state of a task, or None if it was not planned
    pub fn state(&self, id: &TaskId) -> Option<TaskState> {
        self.states.get(id).copied()
    }

    /// Returns true if the task should run in this pass
    ///
    /// In failed-only mode only tasks currently failed are candidates.
    pub fn is_candidate(&self, id: &TaskId, failed_only: bool) -> bool {
        match self.state(id) {
            Some(TaskState::Failed) => true,
            Some(TaskState::Pending) => !failed_only,
            _ => false,
        }
    }

    pub fn start(&mut self, id: &TaskId) -> Result<(), CrawlError> {
        self.move_to(id, TaskState::Running)
    }

    pub fn complete(&mut self, id: &TaskId) -> Result<(), CrawlError> {
        self.move_to(id, TaskState::Completed)
    }

    pub fn fail(&mut self, id: &TaskId) -> Result<(), CrawlError> {
        self.move_to(id, TaskState::Failed)
    }

    /// Puts a running task back to pending after an interrupt
    pub fn interrupt(&mut self, id: &TaskId) -> Result<(), CrawlError> {
        self.move_to(id, TaskState::Pending)
    }

    /// Number of tasks in the given state
    pub fn count(&self, state: TaskState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn move_to(&mut self, id: &TaskId, next: TaskState) -> Result<(), CrawlError> {
        let current = self.states.get(id).copied().unwrap_or(TaskState::Pending);
        let next = current.transition(next)?;
        self.states.insert(id.clone(), next);
        Ok(())
    }
}
