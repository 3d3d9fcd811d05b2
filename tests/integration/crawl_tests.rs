//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock booru servers and run the full
//! fetch → classify → extract → write cycle end-to-end over real HTTP.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tagsift::config::UserAgentConfig;
use tagsift::crawler::{CrawlLimits, FetchScheduler, FetchTask, HttpFetcher, MemorySink, TaskPipeline};
use tagsift::output::OutputWriter;
use tagsift::site::{SiteProfile, SiteRegistry};
use tagsift::state::TaskState;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renders a Safebooru-style post page
fn post_page(general: &[&str]) -> String {
    let items: String = general
        .iter()
        .map(|tag| format!(r#"<li class="tag-type-general"><a href="?tags={tag}">{tag}</a> <span>1</span></li>"#))
        .collect();
    format!(
        r#"<html><head><title>Post</title></head><body>
        <ul id="tag-sidebar">
            <li class="tag-type-artist"><a href="?tags=someone">someone</a></li>
            {}
        </ul>
        </body></html>"#,
        items
    )
}

/// A Safebooru-like profile pointed at the mock server
fn test_profile(server: &MockServer) -> SiteProfile {
    let host = url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    SiteProfile {
        id: "mockbooru".to_string(),
        aliases: vec!["mock".to_string()],
        allowed_domain: host,
        tags_container_selector: "#tag-sidebar".to_string(),
        tag_category_selectors: BTreeMap::from([
            ("artist".to_string(), "li.tag-type-artist > a".to_string()),
            ("general".to_string(), "li.tag-type-general > a".to_string()),
        ]),
        post_url_template: Some(format!("{}/post/{{id}}", server.uri())),
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
    }
}

fn limits(timeout: Duration) -> CrawlLimits {
    CrawlLimits {
        max_parallelism: 8,
        per_domain_limit: 4,
        request_timeout: timeout,
        domain_delay: Duration::ZERO,
    }
}

/// Builds a scheduler for the mock site, writing into `dir`
fn create_scheduler(
    server: &MockServer,
    dir: &Path,
    categories: &[&str],
    timeout: Duration,
) -> (FetchScheduler, Arc<SiteProfile>, Arc<MemorySink>) {
    let registry = SiteRegistry::builtin().with_profiles([test_profile(server)]);
    let profile = registry.resolve("mock").unwrap();
    let fetcher =
        HttpFetcher::from_config(&user_agent(), timeout, registry.allowed_domains()).unwrap();
    let sink = Arc::new(MemorySink::new());

    let pipeline = TaskPipeline::new(
        Arc::new(fetcher),
        Arc::clone(&profile),
        categories.iter().map(|c| c.to_string()).collect(),
        OutputWriter::new(dir),
    )
    .with_sink(sink.clone());

    (
        FetchScheduler::new(registry.allowed_domains(), pipeline),
        profile,
        sink,
    )
}

fn post_task(profile: &SiteProfile, id: u64) -> FetchTask {
    FetchTask::seed(&profile.post_url(id).unwrap()).unwrap()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut contents: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    contents.sort();
    contents
}

#[tokio::test]
async fn test_single_post_writes_general_tags() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["a", "b", "c"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (scheduler, profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    scheduler.submit(post_task(&profile, 1)).unwrap();

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.written.len(), 1);
    assert_eq!(files_in(dir.path()), vec!["a, b, c"]);
    assert!(report.written[0]
        .extension()
        .is_some_and(|ext| ext == "txt"));
    assert_eq!(sink.with_state(TaskState::Fetched)[0].status_code, Some(200));
}

#[tokio::test]
async fn test_category_order_follows_request() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["x", "y"])))
        .mount(&mock_server)
        .await;

    let (scheduler, profile, _sink) = create_scheduler(
        &mock_server,
        dir.path(),
        &["general", "copyright", "artist"],
        Duration::from_secs(5),
    );
    scheduler.submit(post_task(&profile, 1)).unwrap();
    scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(files_in(dir.path()), vec!["x, y, someone"]);
}

#[tokio::test]
async fn test_redirected_post_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let listing = format!("{}/list", mock_server.uri());
    Mock::given(method("GET"))
        .and(path("/post/404"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", listing.as_str()))
        .mount(&mock_server)
        .await;

    // The listing page has tags of its own; they must not be harvested
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["wrong"])))
        .mount(&mock_server)
        .await;

    let (scheduler, profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    let task = post_task(&profile, 404);
    let original = task.url.to_string();
    scheduler.submit(task).unwrap();

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.count(TaskState::Redirected), 1);
    assert!(files_in(dir.path()).is_empty());
    let warnings = sink.with_state(TaskState::Redirected);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.ends_with(&original));
}

#[tokio::test]
async fn test_redirect_off_allow_list_is_not_followed() {
    let mock_server = MockServer::start().await;
    let outside_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Same machine, but "localhost" is not on the allow-list
    let outside_port = url::Url::parse(&outside_server.uri())
        .unwrap()
        .port()
        .unwrap();
    let outside = format!("http://localhost:{}/elsewhere", outside_port);

    Mock::given(method("GET"))
        .and(path("/post/7"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", outside.as_str()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["escaped"])))
        .mount(&outside_server)
        .await;

    let (scheduler, profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    scheduler.submit(post_task(&profile, 7)).unwrap();

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert!(outside_server.received_requests().await.unwrap().is_empty());
    assert_eq!(report.count(TaskState::FetchFailed), 1);
    assert_eq!(sink.with_state(TaskState::FetchFailed)[0].status_code, Some(302));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_referer_marks_task_as_redirected() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let referer = format!("{}/list", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/post/5"))
        .and(header("referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["a"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (scheduler, profile, _sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    scheduler
        .submit(post_task(&profile, 5).with_origin(referer.clone()))
        .unwrap();

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.count(TaskState::Redirected), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_error_statuses_are_fetch_failures() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/post/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/post/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["ok"])))
        .mount(&mock_server)
        .await;

    let (scheduler, profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    for id in 1..=3 {
        scheduler.submit(post_task(&profile, id)).unwrap();
    }

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.count(TaskState::FetchFailed), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(files_in(dir.path()), vec!["ok"]);

    let mut statuses: Vec<Option<u16>> = sink
        .with_state(TaskState::FetchFailed)
        .iter()
        .map(|e| e.status_code)
        .collect();
    statuses.sort();
    assert_eq!(statuses, vec![Some(404), Some(503)]);
}

#[tokio::test]
async fn test_slow_post_times_out_without_blocking_others() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/post/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(post_page(&["late"]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["fast"])))
        .mount(&mock_server)
        .await;

    let timeout = Duration::from_millis(500);
    let (scheduler, profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], timeout);
    for id in 0..10 {
        scheduler.submit(post_task(&profile, id)).unwrap();
    }

    let started = Instant::now();
    let report = scheduler.run(limits(timeout)).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.succeeded(), 9);
    assert_eq!(report.count(TaskState::FetchFailed), 1);
    assert_eq!(files_in(dir.path()).len(), 9);
    assert!(sink.with_state(TaskState::FetchFailed)[0]
        .message
        .contains("timed out"));
}

#[tokio::test]
async fn test_disallowed_domain_is_never_fetched() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&["a"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (scheduler, _profile, sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    let outside = FetchTask::seed("http://example.com/post/1").unwrap();
    assert!(scheduler.submit(outside).is_err());

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.count(TaskState::DomainRejected), 1);
    assert_eq!(report.total(), 1);
    assert_eq!(sink.with_state(TaskState::DomainRejected).len(), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_page_without_tags_writes_nothing() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>deleted</body></html>"))
        .mount(&mock_server)
        .await;

    let (scheduler, profile, _sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    scheduler.submit(post_task(&profile, 1)).unwrap();

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.count(TaskState::ExtractionFailed), 1);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_many_posts_get_distinct_files() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(post_page(&["same"]))
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&mock_server)
        .await;

    let (scheduler, profile, _sink) =
        create_scheduler(&mock_server, dir.path(), &["general"], Duration::from_secs(5));
    for id in 0..25 {
        scheduler.submit(post_task(&profile, id)).unwrap();
    }

    let report = scheduler.run(limits(Duration::from_secs(5))).await;

    assert_eq!(report.succeeded(), 25);
    let mut names = report.written.clone();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 25);
    assert!(files_in(dir.path()).iter().all(|content| content == "same"));
}
