//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the task loop that coordinates a run:
//! - Skipping completed tasks and selecting failed ones for retry
//! - Listing each task's category pages and pre-filtering titles
//! - Resolving film pages through a bounded worker pool
//! - Recording outcomes and persisting the checkpoint after every task
//! - Pausing after a task budget and stopping cleanly on cancellation

use crate::checkpoint::{CheckpointState, CheckpointStore, DetailInfo, Record};
use crate::config::{Config, DetailFailurePolicy};
use crate::crawler::category::{CategoryFetcher, ListedEntity};
use crate::crawler::detail::{DetailCache, DetailError, DetailFetcher};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::PageSource;
use crate::filter::{FilterDecision, GenreFilter};
use crate::output::{RunSummary, TaskCounts};
use crate::planner::{plan_tasks, Task};
use crate::state::TaskTracker;
use crate::CrawlError;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every eligible task was attempted
    Finished,

    /// The pause threshold was reached
    Paused,

    /// Cancellation was requested
    Cancelled,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type DetailResult = Result<DetailInfo, DetailError>;

/// Main crawler coordinator structure
///
/// Owns the checkpoint state for the duration of a run. Only the task loop
/// mutates it, after the worker pool of the current task has been joined.
pub struct Coordinator {
    config: Config,
    tasks: Vec<Task>,
    state: CheckpointState,
    store: CheckpointStore,
    tracker: TaskTracker,
    category: CategoryFetcher,
    details: DetailFetcher,
    filter: GenreFilter,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `state` - The loaded (or fresh) checkpoint state
    /// * `store` - Where the state is persisted after every task
    /// * `source` - Transport used for every page
    /// * `cancel` - Token that stops the run cooperatively
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - Planning or filter compilation failed
    pub fn new(
        config: Config,
        state: CheckpointState,
        store: CheckpointStore,
        source: Arc<dyn PageSource>,
        cancel: CancellationToken,
    ) -> Result<Self, CrawlError> {
        let tasks = plan_tasks(&config)?;
        let filter = GenreFilter::from_config(&config.filter)?;

        let limiter = Arc::new(RateLimiter::new(config.fetch.request_delay()));
        let fetcher = PageFetcher::new(source, limiter, RetryPolicy::from_config(&config.fetch));
        let cache = Arc::new(DetailCache::seeded(&state.detail_cache));
        let tracker = TaskTracker::from_checkpoint(&tasks, &state);

        Ok(Self {
            category: CategoryFetcher::new(fetcher.clone()),
            details: DetailFetcher::new(fetcher, cache),
            config,
            tasks,
            state,
            store,
            tracker,
            filter,
            cancel,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn state(&self) -> &CheckpointState {
        &self.state
    }

    pub fn into_state(self) -> CheckpointState {
        self.state
    }

    /// Runs the task loop until the task list is exhausted, the pause
    /// threshold is reached, or cancellation is requested
    ///
    /// The checkpoint is saved after every finished task and once more before
    /// returning. A task interrupted by cancellation stays pending.
    pub async fn run(&mut self) -> Result<RunSummary, CrawlError> {
        let started_at = Utc::now();
        let records_before = self.state.records.len();
        let failed_only = self.config.run.failed_only;
        let pause_after = self.config.run.pause_after;

        let eligible = self
            .tasks
            .iter()
            .filter(|t| self.tracker.is_candidate(&t.id(), failed_only))
            .count();
        let mut counts = TaskCounts {
            planned: self.tasks.len(),
            skipped: self.tasks.len() - eligible,
            ..TaskCounts::default()
        };

        tracing::info!(
            "Planned {} tasks, {} eligible{}",
            counts.planned,
            eligible,
            if failed_only { " (failed only)" } else { "" }
        );

        let mut outcome = RunOutcome::Finished;
        let tasks = self.tasks.clone();

        for task in &tasks {
            let id = task.id();
            if !self.tracker.is_candidate(&id, failed_only) {
                tracing::debug!("Skipping task {} ({:?})", id, self.tracker.state(&id));
                continue;
            }

            if self.cancel.is_cancelled() {
                outcome = RunOutcome::Cancelled;
                break;
            }

            if pause_after > 0 && counts.completed >= pause_after {
                tracing::info!("Pausing after {} completed tasks", counts.completed);
                outcome = RunOutcome::Paused;
                break;
            }

            self.tracker.start(&id)?;
            tracing::info!("Starting task {} ({})", id, task.source_url);

            match self.run_task(task).await {
                Ok(records) => {
                    let kept = records.len();
                    let merged = self.state.mark_completed(&id, records);
                    self.tracker.complete(&id)?;
                    counts.completed += 1;
                    tracing::info!(
                        "Completed task {}: {} titles kept, {} new records",
                        id,
                        kept,
                        merged.added
                    );
                }
                Err(CrawlError::Cancelled) => {
                    self.tracker.interrupt(&id)?;
                    tracing::warn!("Task {} interrupted; it stays pending", id);
                    outcome = RunOutcome::Cancelled;
                    break;
                }
                Err(e) => {
                    tracing::error!("Task {} failed: {}", id, e);
                    self.state.mark_failed(&id, e.to_string());
                    self.tracker.fail(&id)?;
                    counts.failed += 1;
                }
            }

            self.persist()?;
        }

        self.persist()?;
        counts.remaining = eligible - counts.completed - counts.failed;

        let cache = self.details.cache();
        Ok(RunSummary {
            outcome,
            started_at,
            finished_at: Utc::now(),
            counts,
            records_added: self.state.records.len() - records_before,
            records_total: self.state.records.len(),
            cache_size: cache.len(),
            detail_fetches: cache.fetch_count(),
            checkpoint_path: self.store.path().to_path_buf(),
            dataset_path: self.config.output.dataset_path.clone(),
            failure_report_path: self.config.output.failure_report_path.clone(),
        })
    }

    /// Lists, filters and resolves one task into its records
    async fn run_task(&self, task: &Task) -> Result<Vec<Record>, CrawlError> {
        let id = task.id();
        let listed = self.category.fetch_listing(task, &self.cancel).await?;

        let decisions: Vec<FilterDecision> = listed
            .iter()
            .map(|l| self.filter.pre_filter(&l.entity))
            .collect();
        let confirmed = decisions
            .iter()
            .filter(|d| **d == FilterDecision::Confirmed)
            .count();
        tracing::debug!(
            "{}: {} titles listed, {} confirmed by listing",
            id,
            listed.len(),
            confirmed
        );

        let details = self.resolve_details(&listed).await?;

        let mut records = Vec::new();
        for ((listed, decision), detail) in listed.into_iter().zip(decisions).zip(details) {
            let detail = match detail {
                Ok(info) => Some(info),
                Err(e) if self.config.run.detail_failure == DetailFailurePolicy::FailTask => {
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!("{}: no details for '{}': {}", id, listed.entity.title, e);
                    None
                }
            };

            let keep = match decision {
                FilterDecision::Confirmed => true,
                FilterDecision::NeedsDetail => self.filter.post_filter(detail.as_ref()),
            };
            if !keep {
                continue;
            }

            let detail = detail.unwrap_or_default();
            records.push(Record {
                year: task.year,
                category_key: task.category_key.clone(),
                title: listed.entity.title,
                detail_url: listed.entity.detail_url,
                poster_url: detail.poster_url,
                description: detail.description,
                source_url: listed.listing_url,
            });
        }

        Ok(records)
    }

    /// Resolves every listed title through the worker pool
    ///
    /// Results are returned in listing order regardless of completion order.
    /// On cancellation, in-flight work gets the grace period and is then
    /// detached; it keeps filling the shared cache but its results are dropped.
    async fn resolve_details(&self, listed: &[ListedEntity]) -> Result<Vec<DetailResult>, CrawlError> {
        let semaphore = Arc::new(Semaphore::new(self.config.fetch.workers.max(1)));
        let mut pool: JoinSet<(usize, DetailResult)> = JoinSet::new();
        let mut results: Vec<Option<DetailResult>> = vec![None; listed.len()];
        let mut cancelled = false;

        for (index, item) in listed.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|e| CrawlError::Worker(e.to_string()))?
                }
            };

            let details = self.details.clone();
            let url = item.entity.detail_url.clone();
            pool.spawn(async move {
                let _permit = permit;
                (index, details.resolve(&url).await)
            });
        }

        while !cancelled {
            tokio::select! {
                biased;
                joined = pool.join_next() => match joined {
                    Some(Ok((index, result))) => results[index] = Some(result),
                    Some(Err(e)) => {
                        pool.detach_all();
                        return Err(CrawlError::Worker(e.to_string()));
                    }
                    None => break,
                },
                () = self.cancel.cancelled() => cancelled = true,
            }
        }

        if cancelled {
            self.drain_with_grace(&mut pool).await;
            return Err(CrawlError::Cancelled);
        }

        results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CrawlError::Worker("detail result missing".to_string()))
    }

    async fn drain_with_grace(&self, pool: &mut JoinSet<(usize, DetailResult)>) {
        if pool.is_empty() {
            return;
        }

        let grace = self.config.run.grace_period();
        tracing::info!(
            "Waiting up to {:?} for {} detail fetches to finish",
            grace,
            pool.len()
        );

        let drained = tokio::time::timeout(grace, async {
            while pool.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                "Detaching {} detail fetches still running after the grace period",
                pool.len()
            );
            pool.detach_all();
        }
    }

    /// Snapshots the detail cache into the state and saves the checkpoint
    fn persist(&mut self) -> Result<(), CrawlError> {
        self.state.detail_cache = self.details.cache().snapshot();
        self.store.save(&self.state)?;
        Ok(())
    }
}

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client from the fetch configuration
/// 2. Plan the tasks and seed the detail cache from `state`
/// 3. Run the task loop, persisting after every task
///
/// # Returns
///
/// * `Ok((RunSummary, CheckpointState))` - The run ended (finished, paused or
///   cancelled) and the final state was saved
/// * `Err(CrawlError)` - The run could not start or the checkpoint could not
///   be saved
pub async fn run_crawl(
    config: Config,
    state: CheckpointState,
    store: CheckpointStore,
    cancel: CancellationToken,
) -> Result<(RunSummary, CheckpointState), CrawlError> {
    let source = Arc::new(crate::crawler::HttpPageSource::from_config(&config.fetch)?);
    let mut coordinator = Coordinator::new(config, state, store, source, cancel)?;
    let summary = coordinator.run().await?;
    Ok((summary, coordinator.into_state()))
}
