//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small wiki and run full crawls
//! against it, with checkpoints and exports in temporary directories.

use reel_harvest::checkpoint::{CheckpointConfig, CheckpointState, CheckpointStore};
use reel_harvest::config::{CategoryEntry, Config};
use reel_harvest::crawler::{run_crawl, RunOutcome};
use reel_harvest::output::{
    export_dataset, read_manual_records, sorted_records, write_failure_report, RunSummary,
};
use reel_harvest::{Record, TaskId};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HORROR_PLOT: &str =
    "A young couple moves into an old bungalow that turns out to be haunted by a restless spirit.";
const DRAMA_PLOT: &str =
    "A young couple struggles to keep their family business alive in a changing Chennai market.";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, categories: &[&str], years: (i32, i32), dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawl.base_url = base_url.to_string();
    config.crawl.categories = categories.iter().map(|c| c.to_string()).collect();
    config.crawl.start_year = years.0;
    config.crawl.end_year = years.1;
    config.fetch.workers = 2;
    config.fetch.request_delay_ms = 0;
    config.fetch.timeout_secs = 5;
    config.fetch.max_attempts = 3;
    config.fetch.backoff_base_ms = 10;
    config.fetch.backoff_max_ms = 20;
    config.run.grace_period_secs = 1;
    config.output.checkpoint_path = dir.path().join("progress.json");
    config.output.dataset_path = dir.path().join("movies.csv");
    config.output.failure_report_path = dir.path().join("failed.csv");
    config
}

fn listing_path(year: i32, language: &str) -> String {
    format!("/wiki/Category:{}_{}-language_films", year, language)
}

fn category_html(heading: &str, films: &[&str], next: Option<&str>) -> String {
    let items: String = films
        .iter()
        .map(|name| format!(r#"<li><a href="/wiki/{}" title="{}">{}</a></li>"#, name, name, name))
        .collect();
    let next = next
        .map(|href| format!(r#"(previous page) (<a href="{}">next page</a>)"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>{}</title></head><body>
        <h1 id="firstHeading">{}</h1>
        <div id="mw-content-text"><div id="mw-pages">
        <h2>Pages in category</h2><ul>{}</ul>{}</div></div>
        </body></html>"#,
        heading, heading, items, next
    )
}

fn film_html(name: &str, plot: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <div class="mw-parser-output">
        <table class="infobox"><tr><td><img src="//upload.example.org/{}.jpg" width="220"></td></tr></table>
        <p>{}<sup>[1]</sup></p>
        </div></body></html>"#,
        name, name, plot
    )
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn crawl(config: &Config, state: CheckpointState) -> (RunSummary, CheckpointState) {
    let store = CheckpointStore::new(&config.output.checkpoint_path);
    run_crawl(config.clone(), state, store, CancellationToken::new())
        .await
        .expect("Crawl failed")
}

fn fresh_state(config: &Config) -> CheckpointState {
    CheckpointState::new(CheckpointConfig::from_config(config))
}

fn resume_state(config: &Config) -> CheckpointState {
    CheckpointStore::new(&config.output.checkpoint_path)
        .load_for_resume(&CheckpointConfig::from_config(config))
        .expect("Failed to load checkpoint")
}

fn titles(records: &[Record]) -> Vec<String> {
    sorted_records(records).into_iter().map(|r| r.title).collect()
}

/// Mounts two Tamil years with one horror title each and one drama title
async fn mount_two_tamil_years(server: &MockServer) {
    mount_page(
        server,
        &listing_path(2004, "Tamil"),
        category_html("Category:2004 Tamil-language films", &["Pey", "Kadhal"], None),
    )
    .await;
    mount_page(
        server,
        &listing_path(2005, "Tamil"),
        category_html("Category:2005 Tamil-language films", &["Aavi"], None),
    )
    .await;
    mount_page(server, "/wiki/Pey", film_html("Pey", HORROR_PLOT)).await;
    mount_page(server, "/wiki/Aavi", film_html("Aavi", HORROR_PLOT)).await;
    mount_page(server, "/wiki/Kadhal", film_html("Kadhal", DRAMA_PLOT)).await;
}

#[tokio::test]
async fn test_full_crawl_exports_matching_titles() {
    let mock_server = MockServer::start().await;
    mount_two_tamil_years(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2005), &dir);

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.counts.planned, 2);
    assert_eq!(summary.counts.completed, 2);
    assert_eq!(summary.records_added, 2);
    assert_eq!(titles(&state.records), vec!["Pey", "Aavi"]);

    let pey = &state.records[0];
    assert_eq!(pey.category_key, "tamil");
    assert_eq!(pey.detail_url, format!("{}/wiki/Pey", mock_server.uri()));
    assert_eq!(pey.poster_url.as_deref(), Some("https://upload.example.org/Pey.jpg"));
    assert_eq!(pey.description.as_deref(), Some(HORROR_PLOT));

    // the checkpoint on disk matches the returned state
    let saved = resume_state(&config);
    assert_eq!(saved.records, state.records);
    assert_eq!(saved.completed_tasks.len(), 2);

    export_dataset(&state.records, &config.output.dataset_path).unwrap();
    let csv_text = std::fs::read_to_string(&config.output.dataset_path).unwrap();
    assert_eq!(csv_text.lines().count(), 3);
    assert!(dir.path().join("movies.json").exists());
}

#[tokio::test]
async fn test_pagination_follows_next_link() {
    let mock_server = MockServer::start().await;
    let first = listing_path(2004, "Tamil");
    let second = format!("{}_page2", first);

    mount_page(
        &mock_server,
        &first,
        category_html("Category:2004 Tamil-language films", &["Pey"], Some(&second)),
    )
    .await;
    mount_page(
        &mock_server,
        &second,
        category_html("Category:2004 Tamil-language films", &["Aavi", "Pey"], None),
    )
    .await;
    mount_page(&mock_server, "/wiki/Pey", film_html("Pey", HORROR_PLOT)).await;
    mount_page(&mock_server, "/wiki/Aavi", film_html("Aavi", HORROR_PLOT)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2004), &dir);

    let (_, state) = crawl(&config, fresh_state(&config)).await;

    assert_eq!(titles(&state.records), vec!["Aavi", "Pey"]);
}

#[tokio::test]
async fn test_shared_detail_page_fetched_once() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        &listing_path(2004, "Tamil"),
        category_html("Category:2004 Tamil-language films", &["Chandramukhi"], None),
    )
    .await;
    mount_page(
        &mock_server,
        &listing_path(2004, "Telugu"),
        category_html("Category:2004 Telugu-language films", &["Chandramukhi"], None),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/wiki/Chandramukhi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(film_html("Chandramukhi", HORROR_PLOT)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil", "telugu"], (2004, 2004), &dir);

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    // one record per task, both from the same detail page
    assert_eq!(state.records.len(), 2);
    assert_eq!(summary.detail_fetches, 1);
    assert_eq!(state.detail_cache.len(), 1);
}

#[tokio::test]
async fn test_paused_then_resumed_matches_uninterrupted_run() {
    let mock_server = MockServer::start().await;
    mount_two_tamil_years(&mock_server).await;

    let paused_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2005), &paused_dir);
    config.run.pause_after = 1;

    let (first, _) = crawl(&config, fresh_state(&config)).await;
    assert_eq!(first.outcome, RunOutcome::Paused);
    assert_eq!(first.counts.completed, 1);
    assert_eq!(first.counts.remaining, 1);

    config.run.pause_after = 0;
    let (second, resumed) = crawl(&config, resume_state(&config)).await;
    assert_eq!(second.outcome, RunOutcome::Finished);
    assert_eq!(second.counts.skipped, 1);
    assert_eq!(second.counts.completed, 1);

    let straight_dir = TempDir::new().unwrap();
    let straight_config =
        create_test_config(&mock_server.uri(), &["tamil"], (2004, 2005), &straight_dir);
    let (_, straight) = crawl(&straight_config, fresh_state(&straight_config)).await;

    assert_eq!(sorted_records(&resumed.records), sorted_records(&straight.records));
    assert_eq!(resumed.completed_tasks, straight.completed_tasks);
}

#[tokio::test]
async fn test_completed_tasks_never_rerun() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(listing_path(2004, "Tamil")))
        .respond_with(ResponseTemplate::new(200).set_body_string(category_html(
            "Category:2004 Tamil-language films",
            &["Pey"],
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/wiki/Pey", film_html("Pey", HORROR_PLOT)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2004), &dir);

    crawl(&config, fresh_state(&config)).await;
    let (summary, state) = crawl(&config, resume_state(&config)).await;

    assert_eq!(summary.counts.skipped, 1);
    assert_eq!(summary.counts.completed, 0);
    assert_eq!(summary.records_added, 0);
    assert_eq!(state.records.len(), 1);
}

#[tokio::test]
async fn test_failed_only_retries_just_failed_tasks() {
    let mock_server = MockServer::start().await;

    // 2004 is missing on the first run only
    Mock::given(method("GET"))
        .and(path(listing_path(2004, "Tamil")))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_two_tamil_years(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(listing_path(2006, "Tamil")))
        .respond_with(ResponseTemplate::new(200).set_body_string(category_html(
            "Category:2006 Tamil-language films",
            &[],
            None,
        )))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2006), &dir);
    config.run.pause_after = 1;

    let (first, state) = crawl(&config, fresh_state(&config)).await;
    assert_eq!(first.outcome, RunOutcome::Paused);
    assert_eq!(first.counts.failed, 1);
    assert_eq!(first.counts.completed, 1);
    assert!(state.failed_tasks[&TaskId::new(2004, "tamil")].contains("404"));

    config.run.pause_after = 0;
    config.run.failed_only = true;
    let (second, state) = crawl(&config, resume_state(&config)).await;

    assert_eq!(second.outcome, RunOutcome::Finished);
    assert_eq!(second.counts.skipped, 2);
    assert_eq!(second.counts.completed, 1);
    assert!(state.failed_tasks.is_empty());
    assert!(state.completed_tasks.contains(&TaskId::new(2004, "tamil")));
    assert!(!state.completed_tasks.contains(&TaskId::new(2006, "tamil")));
    assert_eq!(titles(&state.records), vec!["Pey", "Aavi"]);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(listing_path(2004, "Tamil")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_two_tamil_years(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2004), &dir);

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    assert_eq!(summary.counts.completed, 1);
    assert_eq!(titles(&state.records), vec!["Pey"]);
}

#[tokio::test]
async fn test_exhausted_retries_fail_task_and_report_it() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(listing_path(2004, "Tamil")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_two_tamil_years(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2005), &dir);

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    // the failure does not stop the run
    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.counts.failed, 1);
    assert_eq!(summary.counts.completed, 1);
    assert_eq!(titles(&state.records), vec!["Aavi"]);

    let rows = write_failure_report(&state, &config.output.failure_report_path).unwrap();
    assert_eq!(rows, 1);
    let report = std::fs::read_to_string(&config.output.failure_report_path).unwrap();
    assert!(report.starts_with("task_id,error\n2004:tamil,"));
    assert!(report.contains("500"));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(listing_path(2004, "Tamil")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2004), &dir);

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    assert_eq!(summary.counts.failed, 1);
    assert!(state.failed_tasks.contains_key(&TaskId::new(2004, "tamil")));
}

#[tokio::test]
async fn test_genre_category_confirms_without_detail_page() {
    let mock_server = MockServer::start().await;

    // every title in a horror category is confirmed by the listing alone
    mount_page(
        &mock_server,
        "/wiki/Category:Indian_horror_films_of_2004",
        category_html("Category:Indian horror films of 2004", &["Lost_Reel", "Pey"], None),
    )
    .await;
    mount_page(&mock_server, "/wiki/Pey", film_html("Pey", DRAMA_PLOT)).await;
    Mock::given(method("GET"))
        .and(path("/wiki/Lost_Reel"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &["horror"], (2004, 2004), &dir);
    config.categories = vec![CategoryEntry {
        key: "horror".to_string(),
        template: "Category:Indian_horror_films_of_{year}".to_string(),
    }];

    let (summary, state) = crawl(&config, fresh_state(&config)).await;

    assert_eq!(summary.counts.completed, 1);
    let records = sorted_records(&state.records);
    assert_eq!(records.len(), 2);

    let lost = records.iter().find(|r| r.title == "Lost_Reel").unwrap();
    assert_eq!(lost.poster_url, None);
    assert_eq!(lost.description, None);

    let pey = records.iter().find(|r| r.title == "Pey").unwrap();
    assert_eq!(pey.description.as_deref(), Some(DRAMA_PLOT));
}

#[tokio::test]
async fn test_manual_records_merge_without_duplicates() {
    let mock_server = MockServer::start().await;
    mount_two_tamil_years(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &["tamil"], (2004, 2004), &dir);
    crawl(&config, fresh_state(&config)).await;

    let manual = dir.path().join("manual.csv");
    std::fs::write(
        &manual,
        format!(
            "year,language,title,movie_page_url,poster_url,description,source_url\n\
             2004,tamil,Pey,{uri}/wiki/Pey,,,manual\n\
             2004,tamil,Manual Film,{uri}/wiki/Manual_Film,,Added by hand,manual\n",
            uri = mock_server.uri()
        ),
    )
    .unwrap();

    let store = CheckpointStore::new(&config.output.checkpoint_path);
    for expected_added in [1, 0] {
        let mut state = store.load_existing().unwrap();
        let outcome = state.merge_manual_records(read_manual_records(&manual).unwrap());
        assert_eq!(outcome.added, expected_added);
        assert_eq!(outcome.skipped, 2 - expected_added);
        store.save(&state).unwrap();
    }

    let state = store.load_existing().unwrap();
    assert_eq!(titles(&state.records), vec!["Manual Film", "Pey"]);
}
