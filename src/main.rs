//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest genre crawler.

use anyhow::{bail, Context};
use clap::Parser;
use reel_harvest::checkpoint::{CheckpointConfig, CheckpointState, CheckpointStore};
use reel_harvest::config::{load_config_with_hash, validate, Config};
use reel_harvest::crawler::run_crawl;
use reel_harvest::output::{
    export_dataset, print_summary, read_manual_records, write_failure_report,
};
use reel_harvest::planner::plan_tasks;
use reel_harvest::{TaskId, TaskState};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Reel-Harvest: a resumable genre crawler for Indian cinema
///
/// Reel-Harvest walks the per-year, per-language film categories of a wiki,
/// keeps the titles that belong to the configured genre, and resolves a poster
/// and description for each. Progress is checkpointed after every task.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version)]
#[command(about = "A resumable genre crawler for Indian cinema", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// First year to crawl
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to crawl, inclusive
    #[arg(long)]
    end_year: Option<i32>,

    /// Category keys, comma separated
    #[arg(long, value_delimiter = ',')]
    categories: Option<Vec<String>>,

    /// Keep the configured category order instead of crawling south Indian categories first
    #[arg(long)]
    no_south_first: bool,

    /// Size of the detail page worker pool
    #[arg(long)]
    workers: Option<usize>,

    /// Minimum delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Pause after this many tasks complete (0 disables)
    #[arg(long)]
    pause_after: Option<usize>,

    /// Continue from an existing checkpoint
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start over, replacing any existing checkpoint
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Only retry tasks recorded as failed
    #[arg(long)]
    failed_only: bool,

    /// Checkpoint file path
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Dataset CSV path (JSON is written alongside)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Merge records from a CSV file into the checkpoint and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "failed_report", "complete_task"])]
    import_records: Option<PathBuf>,

    /// Mark a task (YEAR:CATEGORY) as complete and exit; may be repeated
    #[arg(long, value_name = "ID", conflicts_with_all = ["dry_run", "failed_report", "import_records"])]
    complete_task: Vec<String>,

    /// Write the failed task report from the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "import_records", "complete_task"])]
    failed_report: bool,

    /// Validate config and show the task plan without crawling
    #[arg(long, conflicts_with_all = ["failed_report", "import_records", "complete_task"])]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;
    let store = CheckpointStore::new(&config.output.checkpoint_path);

    if cli.dry_run {
        handle_dry_run(&config, &store)
    } else if cli.failed_report {
        handle_failed_report(&config, &store)
    } else if let Some(path) = &cli.import_records {
        handle_import(&config, &store, path)
    } else if !cli.complete_task.is_empty() {
        handle_complete_tasks(&config, &store, &cli.complete_task)
    } else {
        handle_crawl(config, store, cli.resume, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(year) = cli.start_year {
        config.crawl.start_year = year;
    }
    if let Some(year) = cli.end_year {
        config.crawl.end_year = year;
    }
    if let Some(categories) = &cli.categories {
        config.crawl.categories = categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
    }
    if cli.no_south_first {
        config.crawl.south_first = false;
    }
    if let Some(workers) = cli.workers {
        config.fetch.workers = workers;
    }
    if let Some(delay) = cli.delay_ms {
        config.fetch.request_delay_ms = delay;
    }
    if let Some(pause_after) = cli.pause_after {
        config.run.pause_after = pause_after;
    }
    if cli.failed_only {
        config.run.failed_only = true;
    }
    if let Some(path) = &cli.checkpoint {
        config.output.checkpoint_path = path.clone();
    }
    if let Some(path) = &cli.output {
        config.output.dataset_path = path.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the task plan with checkpoint markers
fn handle_dry_run(config: &Config, store: &CheckpointStore) -> anyhow::Result<()> {
    let tasks = plan_tasks(config)?;
    let state = if store.exists() {
        Some(store.load_existing()?)
    } else {
        None
    };

    println!("=== Reel-Harvest Dry Run ===\n");
    println!(
        "Years: {}..={}  Genre: {}  Workers: {}  Delay: {}ms",
        config.crawl.start_year,
        config.crawl.end_year,
        config.filter.genre,
        config.fetch.workers,
        config.fetch.request_delay_ms
    );
    println!("Checkpoint: {}", store.path().display());
    println!("Dataset:    {}\n", config.output.dataset_path.display());

    let mut pending = 0;
    for task in &tasks {
        let task_state = state
            .as_ref()
            .map_or(TaskState::Pending, |s| s.durable_state(&task.id()));
        let marker = match task_state {
            TaskState::Completed => "[done]  ",
            TaskState::Failed => "[failed]",
            _ => {
                pending += 1;
                "        "
            }
        };
        println!("{} {:<16} {}", marker, task.id(), task.source_url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ {} tasks planned, {} pending", tasks.len(), pending);

    Ok(())
}

/// Handles the --failed-report mode
fn handle_failed_report(config: &Config, store: &CheckpointStore) -> anyhow::Result<()> {
    let state = store.load_existing()?;
    let path = &config.output.failure_report_path;
    let rows = write_failure_report(&state, path)?;

    for (task_id, error) in &state.failed_tasks {
        println!("{}\t{}", task_id, error);
    }
    println!("\n✓ {} failed tasks written to {}", rows, path.display());

    Ok(())
}

/// Handles the --import-records mode
fn handle_import(
    config: &Config,
    store: &CheckpointStore,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    let records = read_manual_records(path)?;
    let mut state = store.load_or_new(&CheckpointConfig::from_config(config))?;

    let outcome = state.merge_manual_records(records);
    store.save(&state)?;

    println!(
        "✓ Imported {} records from {} ({} duplicates skipped)",
        outcome.added,
        path.display(),
        outcome.skipped
    );

    Ok(())
}

/// Handles the --complete-task mode
fn handle_complete_tasks(
    config: &Config,
    store: &CheckpointStore,
    ids: &[String],
) -> anyhow::Result<()> {
    // validate every id before touching the checkpoint
    let ids = ids
        .iter()
        .map(|id| id.parse::<TaskId>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut state = store.load_or_new(&CheckpointConfig::from_config(config))?;
    for id in &ids {
        if state.mark_task_complete_manually(id) {
            println!("✓ {} marked complete (was failed)", id);
        } else {
            println!("✓ {} marked complete", id);
        }
    }
    store.save(&state)?;

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    store: CheckpointStore,
    resume: bool,
    fresh: bool,
) -> anyhow::Result<()> {
    let checkpoint_config = CheckpointConfig::from_config(&config);

    let state = if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
        CheckpointState::new(checkpoint_config)
    } else if store.exists() && !resume {
        bail!(
            "Checkpoint {} already exists; pass --resume to continue it or --fresh to start over",
            store.path().display()
        );
    } else {
        let state = store.load_for_resume(&checkpoint_config)?;
        tracing::info!(
            "Resuming crawl: {} completed, {} failed, {} records",
            state.completed_tasks.len(),
            state.failed_tasks.len(),
            state.records.len()
        );
        state
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            signal_token.cancel();
        }
    });

    let output = config.output.clone();
    let (summary, state) = run_crawl(config, state, store, cancel).await?;

    export_dataset(&state.records, &output.dataset_path)?;
    write_failure_report(&state, &output.failure_report_path)?;
    print_summary(&summary);

    Ok(())
}
