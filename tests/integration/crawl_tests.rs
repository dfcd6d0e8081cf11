//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small paginated blog and run the
//! full crawl cycle end-to-end against a temporary SQLite database.

use chrono::NaiveDate;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use topic_harvester::config::{
    Config, CrawlerConfig, ExtractorConfig, FilterConfig, OutputConfig, UserAgentConfig,
};
use topic_harvester::crawler::crawl;
use topic_harvester::dates::Confidence;
use topic_harvester::storage::{PostStore, RunLedger, SqliteStorage};
use topic_harvester::{CrawlMode, HarvestError, TerminationReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock blog
fn create_test_config(base_url: &str, mode: CrawlMode, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            mode,
            max_pages: None,
            delay_seconds: 0.0, // No politeness pause in tests
            request_timeout_secs: 5,
            fetch_full_content: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        filter: FilterConfig {
            keywords: vec!["quran".to_string(), "hajj".to_string()],
        },
        extractor: ExtractorConfig::default(),
    }
}

/// Renders a listing page from (href, title, body) triples
fn listing_html(posts: &[(&str, &str, &str)], older: Option<&str>) -> String {
    let mut html = String::from("<html><head><title>Blog</title></head><body>");
    for (href, title, body) in posts {
        html.push_str(&format!(
            r#"<article><h2 class="post-title"><a href="{}">{}</a></h2><div class="post-body">{}</div></article>"#,
            href, title, body
        ));
    }
    if let Some(older) = older {
        html.push_str(&format!(
            r#"<div class="blog-pager"><a class="blog-pager-older-link" href="{}">Older Posts</a></div>"#,
            older
        ));
    }
    html.push_str("</body></html>");
    html
}

async fn mount_page(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// Mounts a four-page blog where every page carries one new matching post
async fn mount_four_page_blog(server: &MockServer) {
    for n in 1..=4 {
        let page_path = if n == 1 {
            "/".to_string()
        } else {
            format!("/page/{}", n)
        };
        let older = (n < 4).then(|| format!("/page/{}", n + 1));
        let post_href = format!("/posts/quran-study-{}.html", n);
        let title = format!("Quran study part {}", n);
        let html = listing_html(
            &[(post_href.as_str(), title.as_str(), "Weekly notes.")],
            older.as_deref(),
        );
        mount_page(server, &page_path, html).await;
    }
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("harvest.db").to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_single_page_crawl_stores_matches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        listing_html(
            &[
                ("/posts/reading-the-quran.html", "Reading the Quran", "A first look."),
                ("/posts/gardening.html", "Gardening tips", "Tomatoes and beans."),
                ("/posts/notes.html", "Travel notes", "Preparing for hajj this year."),
            ],
            None,
        ),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = db_path(&temp_dir);
    let config = create_test_config(&base_url, CrawlMode::Historical, &db);

    let summary = crawl(config, "hash-1".to_string(), &CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.articles_found, 2);
    assert_eq!(summary.new_articles, 2);
    assert_eq!(summary.page_errors, 0);
    assert_eq!(summary.stop_reason, TerminationReason::NoNextPage);

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path())
        .expect("Failed to open storage");
    assert_eq!(storage.count_posts().unwrap(), 2);

    let posts = storage.all_posts().unwrap();
    let keywords: Vec<_> = posts.iter().map(|p| p.matched_keyword.as_str()).collect();
    assert!(keywords.contains(&"quran"));
    assert!(keywords.contains(&"hajj"));
    assert!(posts.iter().all(|p| !p.url.contains("gardening")));

    let run = storage.latest_run().unwrap().expect("Run not recorded");
    assert_eq!(run.mode, CrawlMode::Historical);
    assert_eq!(run.new_articles, 2);
    assert_eq!(run.config_hash, "hash-1");
    assert_eq!(run.stop_reason, Some(TerminationReason::NoNextPage));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(
            &[("/posts/quran.html", "On the Quran", "Some text.")],
            None,
        ),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    let cancel = CancellationToken::new();

    let first = crawl(
        create_test_config(&mock_server.uri(), CrawlMode::Historical, &db),
        "h".to_string(),
        &cancel,
    )
    .await
    .unwrap();
    assert_eq!(first.new_articles, 1);

    let second = crawl(
        create_test_config(&mock_server.uri(), CrawlMode::Historical, &db),
        "h".to_string(),
        &cancel,
    )
    .await
    .unwrap();
    assert_eq!(second.articles_found, 1);
    assert_eq!(second.new_articles, 0);

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    assert_eq!(storage.count_posts().unwrap(), 1);
    assert_eq!(storage.count_runs().unwrap(), 2);
}

#[tokio::test]
async fn test_incremental_stops_on_stale_pages() {
    let mock_server = MockServer::start().await;
    mount_four_page_blog(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    let cancel = CancellationToken::new();

    // Backfill everything first
    let backfill = crawl(
        create_test_config(&mock_server.uri(), CrawlMode::Historical, &db),
        "h".to_string(),
        &cancel,
    )
    .await
    .unwrap();
    assert_eq!(backfill.pages_visited, 4);
    assert_eq!(backfill.new_articles, 4);
    assert_eq!(backfill.stop_reason, TerminationReason::NoNextPage);

    // Nothing is new, so an incremental run gives up after two pages
    let incremental = crawl(
        create_test_config(&mock_server.uri(), CrawlMode::Incremental, &db),
        "h".to_string(),
        &cancel,
    )
    .await
    .unwrap();
    assert_eq!(incremental.pages_visited, 2);
    assert_eq!(incremental.new_articles, 0);
    assert_eq!(incremental.stop_reason, TerminationReason::NoNewContent);

    // A historical run keeps walking regardless
    let historical = crawl(
        create_test_config(&mock_server.uri(), CrawlMode::Historical, &db),
        "h".to_string(),
        &cancel,
    )
    .await
    .unwrap();
    assert_eq!(historical.pages_visited, 4);
    assert_eq!(historical.new_articles, 0);
    assert_eq!(historical.stop_reason, TerminationReason::NoNextPage);
}

#[tokio::test]
async fn test_max_pages_cap() {
    let mock_server = MockServer::start().await;
    mount_four_page_blog(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));
    config.crawler.max_pages = Some(2);

    let summary = crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.new_articles, 2);
    assert_eq!(summary.stop_reason, TerminationReason::MaxPagesReached);
}

#[tokio::test]
async fn test_first_page_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));

    let result = crawl(config, "h".to_string(), &CancellationToken::new()).await;
    assert!(matches!(result, Err(HarvestError::FirstPageFetch { .. })));

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    assert_eq!(storage.count_runs().unwrap(), 0);
}

#[tokio::test]
async fn test_mid_run_failure_is_recorded() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(
            &[("/posts/quran.html", "Quran", "Text.")],
            Some("/page/2"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));

    let summary = crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .expect("Mid-run failures must not abort the run");
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.page_errors, 1);
    assert_eq!(summary.new_articles, 1);
    assert_eq!(summary.stop_reason, TerminationReason::FetchFailed);
    assert!(summary.last_url.unwrap().ends_with("/page/2"));

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    assert_eq!(storage.count_posts().unwrap(), 1);
    let run = storage.latest_run().unwrap().unwrap();
    assert_eq!(run.page_errors, 1);
    assert_eq!(run.stop_reason, Some(TerminationReason::FetchFailed));
}

#[tokio::test]
async fn test_self_link_stops_pagination() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(&[("/posts/quran.html", "Quran", "Text.")], Some("/")),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));

    let summary = crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.stop_reason, TerminationReason::PaginationLoop);
}

#[tokio::test]
async fn test_date_from_url_filename() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(
            &[("/posts/quran-notes-2024-03-15.html", "Quran notes", "Text.")],
            None,
        ),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));
    crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    let posts = storage.all_posts().unwrap();
    assert_eq!(posts.len(), 1);

    let post = &posts[0];
    assert_eq!(post.date_source, "url_filename");
    assert_eq!(post.date_confidence, Confidence::High);
    assert_eq!(
        post.publish_date_resolved.map(|d| d.date()),
        NaiveDate::from_ymd_opt(2024, 3, 15)
    );
}

#[tokio::test]
async fn test_full_content_fetch() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(
            &[("/posts/quran.html", "Quran", "Short excerpt.")],
            None,
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/posts/quran.html",
        r#"<html><body>
            <div class="header">Site header</div>
            <div class="post-body">The full text about the Quran.</div>
            <div class="sidebar">Archive links</div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));
    config.crawler.fetch_full_content = true;

    crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    let post = &storage.all_posts().unwrap()[0];
    assert_eq!(post.content_excerpt, "Short excerpt.");
    assert_eq!(post.full_content, "The full text about the Quran.");
    assert_eq!(post.word_count, 6);
}

#[tokio::test]
async fn test_cancelled_run_is_still_recorded() {
    let mock_server = MockServer::start().await;
    mount_four_page_blog(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = crawl(config, "h".to_string(), &cancel).await.unwrap();
    assert_eq!(summary.stop_reason, TerminationReason::Cancelled);
    assert_eq!(summary.pages_visited, 0);

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    assert_eq!(storage.count_runs().unwrap(), 1);
    assert_eq!(storage.count_posts().unwrap(), 0);
}

#[tokio::test]
async fn test_full_content_keeps_whole_listing_text() {
    let mock_server = MockServer::start().await;
    let body = format!("Quran {}", vec!["commentary"; 199].join(" "));
    mount_page(
        &mock_server,
        "/",
        listing_html(&[("/posts/long.html", "Long read", body.as_str())], None),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));
    crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();

    let storage = SqliteStorage::new(temp_dir.path().join("harvest.db").as_path()).unwrap();
    let post = &storage.all_posts().unwrap()[0];
    assert_eq!(post.full_content, body);
    assert_eq!(post.word_count, 200);
    assert_eq!(post.content_excerpt.chars().count(), 500);
}

#[tokio::test]
async fn test_page_without_posts_is_paginated_past() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        listing_html(&[("/posts/one.html", "Quran one", "Text.")], Some("/page/2")),
    )
    .await;
    mount_page(
        &mock_server,
        "/page/2",
        r#"<html><body><p>Nothing here this week.</p>
            <div class="blog-pager"><a class="blog-pager-older-link" href="/page/3">Older Posts</a></div>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page/3",
        listing_html(&[("/posts/three.html", "Quran three", "Text.")], None),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), CrawlMode::Historical, &db_path(&temp_dir));
    let summary = crawl(config, "h".to_string(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.new_articles, 2);
    assert_eq!(summary.page_errors, 0);
    assert_eq!(summary.stop_reason, TerminationReason::NoNextPage);
}
