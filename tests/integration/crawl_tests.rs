//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, including resumption from checkpoints.

use docharvest::config::{
    Config, CrawlerConfig, RulesConfig, StateConfig, UserAgentConfig, VerifierConfig,
};
use docharvest::crawler::Coordinator;
use docharvest::state::{FRONTIER_FILE, IN_FLIGHT_FILE, UNREACHABLE_FILE, VISITED_FILE};
use docharvest::storage::DocumentStore;
use docharvest::MatchMode;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with all state under `dir`
fn create_test_config(dir: &Path, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            request_delay_ms: 100, // Very short for testing
            request_timeout_secs: 5,
            pdf_batch_size: 20,
            failure_budget: 1,
        },
        verifier: VerifierConfig {
            request_delay_ms: 100,
            prefix_bytes: 32,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        state: StateConfig {
            directory: dir.join("state"),
            database_path: dir.join("state").join("documents.db"),
        },
        rules: RulesConfig {
            allow_file: dir.join("allow.txt"),
            block_file: dir.join("block.txt"),
            match_mode: MatchMode::DomainSuffix,
        },
    }
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_crawl_records_documents() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Library</title>
            <meta name="author" content="The Librarian"></head><body>
            <a href="/papers.html">Papers</a>
            <a href="/a.pdf" title="First paper">Paper A</a>
            <a href="/download?id=7"></a>
            <a href="/report">Report</a>
            <a href="/logo.png">Logo</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/papers.html"))
        .respond_with(html(
            r#"<html><head><title>Papers</title></head><body>
            <a href="/b.pdf">Paper B</a>
            <a href="/a.pdf">Paper A again</a>
            <a href="/">Home</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Document links are recorded, never fetched during the crawl
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);

    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    assert!(coordinator.needs_seed());
    assert!(coordinator.add_seed(&format!("{}/", base)).unwrap());

    let summary = coordinator.run().await.expect("Crawl failed");

    assert!(!summary.interrupted);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.content_mismatches, 1);
    assert_eq!(summary.documents_found, 3);
    assert_eq!(summary.documents_inserted, 3);
    assert_eq!(summary.frontier_remaining, 0);

    let storage = coordinator.storage();
    assert_eq!(storage.count_documents().unwrap(), 3);

    let doc = storage
        .get_document_by_url(&format!("{}/a.pdf", base))
        .unwrap()
        .expect("a.pdf should be recorded");
    assert_eq!(doc.source_url, format!("{}/", base));
    assert_eq!(doc.source_title.as_deref(), Some("Library"));
    assert_eq!(doc.source_author.as_deref(), Some("The Librarian"));
    assert_eq!(doc.link_extension.as_deref(), Some("pdf"));
    assert_eq!(doc.link_text.as_deref(), Some("Paper A"));
    assert_eq!(doc.link_title.as_deref(), Some("First paper"));
    assert!(doc.link_date_added.is_some());
    assert_eq!(doc.link_http_code, None);

    let download = storage
        .get_document_by_url(&format!("{}/download?id=7", base))
        .unwrap()
        .expect("download link should be recorded");
    assert_eq!(download.link_text.as_deref(), Some("[no text]"));

    let b = storage
        .get_document_by_url(&format!("{}/b.pdf", base))
        .unwrap()
        .expect("b.pdf should be recorded");
    assert_eq!(b.source_title.as_deref(), Some("Papers"));

    let state_dir = dir.path().join("state");
    let mut visited = read_lines(&state_dir.join(VISITED_FILE));
    visited.sort();
    let mut expected = vec![
        format!("{}/", base),
        format!("{}/papers.html", base),
        format!("{}/report", base),
    ];
    expected.sort();
    assert_eq!(visited, expected);
    assert!(read_lines(&state_dir.join(FRONTIER_FILE)).is_empty());
    assert!(read_lines(&state_dir.join(IN_FLIGHT_FILE)).is_empty());

    mock_server.verify().await;
}

#[tokio::test]
async fn test_restart_does_not_refetch_visited_pages() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/next.html">Next</a><a href="/x.pdf">X</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next.html"))
        .respond_with(html(r#"<a href="/">Back</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);
    let seed = format!("{}/", base);

    {
        let mut coordinator = Coordinator::new(&config).unwrap();
        coordinator.add_seed(&seed).unwrap();
        let summary = coordinator.run().await.unwrap();
        assert_eq!(summary.pages_fetched, 2);
    }

    // Same checkpoints, same seed: everything is already visited.
    let mut coordinator = Coordinator::new(&config).unwrap();
    assert_eq!(coordinator.session().state().visited_count(), 2);
    assert!(!coordinator.add_seed(&seed).unwrap());
    assert!(coordinator.needs_seed());

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(coordinator.storage().count_documents().unwrap(), 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_in_flight_entries_requeued_on_startup() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/interrupted.html">Again</a>"#))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/interrupted.html"))
        .respond_with(html(r#"<a href="/late.pdf">Late</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);

    // A previous run stopped while fetching /interrupted.html
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(state_dir.join(VISITED_FILE), format!("{}/\n", base)).unwrap();
    std::fs::write(
        state_dir.join(IN_FLIGHT_FILE),
        format!("{}/interrupted.html|1\n", base),
    )
    .unwrap();

    let mut coordinator = Coordinator::new(&config).unwrap();
    assert!(!coordinator.needs_seed());
    assert_eq!(coordinator.session().state().in_flight_count(), 0);

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.documents_found, 1);
    assert!(read_lines(&state_dir.join(IN_FLIGHT_FILE)).is_empty());

    mock_server.verify().await;
}

#[tokio::test]
async fn test_meta_refresh_followed_at_same_depth() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><meta http-equiv="refresh" content="0;url=/new"></head>
            <body><a href="/skipped.pdf">Skipped</a><a href="/skipped.html">Skipped</a></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(r#"<a href="/found.pdf">Found</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/skipped.html"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    // Depth 0 only: the refresh target must keep the seed's depth to be fetched
    let config = create_test_config(dir.path(), 0);

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator.add_seed(&format!("{}/", base)).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.meta_refreshes, 1);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(summary.documents_found, 1);

    let storage = coordinator.storage();
    assert!(storage
        .get_document_by_url(&format!("{}/found.pdf", base))
        .unwrap()
        .is_some());
    assert!(storage
        .get_document_by_url(&format!("{}/skipped.pdf", base))
        .unwrap()
        .is_none());

    mock_server.verify().await;
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/level1.html">Level 1</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/level1.html"))
        .respond_with(html(
            r#"<a href="/level2.html">Level 2</a><a href="/deep.pdf">Deep document</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/level2.html"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 1);

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator.add_seed(&format!("{}/", base)).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.documents_found, 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_block_rules_skip_pages_and_documents() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/public.html">Public</a>
            <a href="/private/secret.html">Secret</a>
            <a href="/private/doc.pdf">Private doc</a>
            <a href="/open.pdf">Open doc</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public.html"))
        .respond_with(html(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/secret.html"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("block.txt"), "# no private areas\n/private/\n").unwrap();
    let mut config = create_test_config(dir.path(), 3);
    config.rules.match_mode = MatchMode::Substring;

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator.add_seed(&format!("{}/", base)).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.documents_found, 1);
    assert!(coordinator
        .storage()
        .get_document_by_url(&format!("{}/open.pdf", base))
        .unwrap()
        .is_some());

    mock_server.verify().await;
}

#[tokio::test]
async fn test_http_redirect_marks_both_urls_visited() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/moved.html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved.html"))
        .respond_with(html(r#"<a href="/moved.pdf">Moved</a><a href="/old">Old</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator.add_seed(&format!("{}/old", base)).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.documents_found, 1);

    let doc = coordinator
        .storage()
        .get_document_by_url(&format!("{}/moved.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(doc.source_url, format!("{}/moved.html", base));

    let state = coordinator.session().state();
    assert!(state.is_visited(&format!("{}/old", base)));
    assert!(state.is_visited(&format!("{}/moved.html", base)));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_cross_domain_redirect_waits_for_target_domain() {
    let origin = MockServer::start().await;
    let target = MockServer::start().await;

    let hits: Arc<Mutex<Vec<(String, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let hits = Arc::clone(&hits);
        move |request: &wiremock::Request| {
            hits.lock()
                .unwrap()
                .push((request.url.path().to_string(), Instant::now()));
            html("<p>Nothing to follow</p>")
        }
    };
    Mock::given(method("GET"))
        .respond_with(recorder)
        .expect(2)
        .mount(&target)
        .await;

    let other = format!("{}/other.html", target.uri());
    Mock::given(method("GET"))
        .and(path("/redir"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", other.as_str()))
        .expect(1)
        .mount(&origin)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 3);
    config.crawler.request_delay_ms = 500;

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator
        .add_seed(&format!("{}/first.html", target.uri()))
        .unwrap();
    coordinator
        .add_seed(&format!("{}/redir", origin.uri()))
        .unwrap();
    coordinator.run().await.unwrap();

    let hits = hits.lock().unwrap().clone();
    let paths: Vec<&str> = hits.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["/first.html", "/other.html"]);

    // Allow a little jitter between client send and server receipt.
    let gap = hits[1].1.duration_since(hits[0].1);
    assert!(gap >= Duration::from_millis(450), "gap was {:?}", gap);

    assert!(coordinator.session().state().is_visited(&other));

    origin.verify().await;
    target.verify().await;
}

#[tokio::test]
async fn test_network_failure_marks_domain_unreachable() {
    // Bind then drop a listener so nothing accepts on that port.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3);

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator
        .add_seed(&format!("http://127.0.0.1:{}/", port))
        .unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.network_failures, 1);
    assert_eq!(summary.domains_unreachable, 1);

    let state_dir = dir.path().join("state");
    assert_eq!(
        read_lines(&state_dir.join(UNREACHABLE_FILE)),
        vec![format!("127.0.0.1:{}", port)]
    );
    let errors = read_lines(&state_dir.join("errors.log"));
    assert!(errors.iter().any(|l| l.contains("Request failed")));

    // The domain stays off limits after a restart.
    let mut coordinator = Coordinator::new(&config).unwrap();
    assert!(!coordinator
        .add_seed(&format!("http://127.0.0.1:{}/other", port))
        .unwrap());
}

#[tokio::test]
async fn test_interrupt_checkpoints_remaining_frontier() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a.html">A</a><a href="/b.html">B</a>"#))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 3);
    // Long enough that the follow-up pages are still waiting at shutdown
    config.crawler.request_delay_ms = 5_000;

    let mut coordinator = Coordinator::new(&config).unwrap();
    coordinator.add_seed(&format!("{}/", base)).unwrap();

    let shutdown = tokio::time::sleep(std::time::Duration::from_millis(500));
    let summary = coordinator.run_until(shutdown).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.frontier_remaining, 2);

    let frontier = read_lines(&dir.path().join("state").join(FRONTIER_FILE));
    assert_eq!(
        frontier,
        vec![format!("{}/a.html|1", base), format!("{}/b.html|1", base)]
    );

    mock_server.verify().await;
}
