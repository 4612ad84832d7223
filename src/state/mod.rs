//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskState`: lifecycle of a single task (pending, running, completed, failed)
//! - `TaskTracker`: in-memory view of every planned task's state for one run

mod task_state;
mod tracker;

// Re-export main types
pub use task_state::TaskState;
pub use tracker::TaskTracker;
