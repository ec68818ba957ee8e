//! Integration tests for the link verification pass
//!
//! Documents are inserted directly into the database, then verified against
//! wiremock servers.

use docharvest::config::{
    Config, CrawlerConfig, RulesConfig, StateConfig, UserAgentConfig, VerifierConfig,
};
use docharvest::state::ERROR_LOG_FILE;
use docharvest::storage::{open_storage, DocumentCandidate, DocumentStore};
use docharvest::verify::Verifier;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 3,
            request_delay_ms: 100,
            request_timeout_secs: 5,
            pdf_batch_size: 20,
            failure_budget: 1,
        },
        verifier: VerifierConfig {
            request_delay_ms: 200,
            prefix_bytes: 16,
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
            match_mode: Default::default(),
        },
    }
}

fn candidate(url: String) -> DocumentCandidate {
    DocumentCandidate {
        url,
        source_url: "https://example.com/".to_string(),
        source_title: Some("Index".to_string()),
        source_author: None,
        link_extension: "pdf".to_string(),
        link_text: "[no text]".to_string(),
        link_title: None,
    }
}

fn seed_documents(config: &Config, urls: Vec<String>) {
    let mut storage = open_storage(&config.state.database_path).unwrap();
    let docs: Vec<DocumentCandidate> = urls.into_iter().map(candidate).collect();
    assert_eq!(storage.insert_documents(&docs).unwrap(), docs.len());
}

fn closed_port() -> u16 {
    // Bind then drop a listener so nothing accepts on that port.
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn test_verification_records_http_metadata() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let pdf_body = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec();
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(pdf_body.clone(), "application/pdf")
                .insert_header("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("missing", "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let dead_url = format!("http://127.0.0.1:{}/dead.pdf", closed_port());
    seed_documents(
        &config,
        vec![
            format!("{}/paper.pdf", base),
            format!("{}/gone.pdf", base),
            dead_url.clone(),
        ],
    );

    let mut verifier = Verifier::new(&config).unwrap();
    assert_eq!(verifier.load_pending().unwrap(), 3);

    let summary = verifier.run().await.unwrap();
    assert!(!summary.interrupted);
    assert_eq!(summary.checked, 3);
    assert_eq!(summary.recorded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.remaining, 0);

    let storage = verifier.storage();
    let paper = storage
        .get_document_by_url(&format!("{}/paper.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(paper.link_http_code, Some(200));
    assert_eq!(paper.link_content_type.as_deref(), Some("application/pdf"));
    assert_eq!(paper.link_content_length, Some(pdf_body.len() as i64));
    assert_eq!(
        paper.link_last_modified.as_deref(),
        Some("Wed, 21 Oct 2015 07:28:00 GMT")
    );
    assert_eq!(paper.doc_initial_bytes, Some(pdf_body[..16].to_vec()));
    assert!(paper.link_date_accessed.is_some());

    let gone = storage
        .get_document_by_url(&format!("{}/gone.pdf", base))
        .unwrap()
        .unwrap();
    assert_eq!(gone.link_http_code, Some(404));
    assert_eq!(gone.doc_initial_bytes.unwrap_or_default(), Vec::<u8>::new());

    let dead = storage.get_document_by_url(&dead_url).unwrap().unwrap();
    assert_eq!(dead.link_http_code, None);
    assert_eq!(storage.count_unverified().unwrap(), 1);

    let errors = std::fs::read_to_string(dir.path().join("state").join(ERROR_LOG_FILE)).unwrap();
    assert!(errors.contains("Verification failed"));
    assert!(errors.contains(&dead_url));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_second_pass_only_retries_unverified_rows() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/once.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    seed_documents(&config, vec![format!("{}/once.pdf", base)]);

    {
        let mut verifier = Verifier::new(&config).unwrap();
        assert_eq!(verifier.load_pending().unwrap(), 1);
        let summary = verifier.run().await.unwrap();
        assert_eq!(summary.recorded, 1);
    }

    let mut verifier = Verifier::new(&config).unwrap();
    assert_eq!(verifier.load_pending().unwrap(), 0);
    let summary = verifier.run().await.unwrap();
    assert_eq!(summary.checked, 0);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_same_domain_probes_respect_delay() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    seed_documents(
        &config,
        (1..=3).map(|i| format!("{}/{}.pdf", base, i)).collect(),
    );

    let mut verifier = Verifier::new(&config).unwrap();
    verifier.load_pending().unwrap();

    let start = Instant::now();
    let summary = verifier.run().await.unwrap();
    assert_eq!(summary.recorded, 3);

    // Three requests to one domain need at least two full delays.
    assert!(start.elapsed() >= Duration::from_millis(2 * 200));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_interrupt_leaves_rows_unverified() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.verifier.request_delay_ms = 5_000;
    seed_documents(
        &config,
        vec![format!("{}/1.pdf", base), format!("{}/2.pdf", base)],
    );

    let mut verifier = Verifier::new(&config).unwrap();
    verifier.load_pending().unwrap();

    let summary = verifier
        .run_until(tokio::time::sleep(Duration::from_millis(500)))
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.remaining, 1);
    assert_eq!(verifier.storage().count_unverified().unwrap(), 1);
}
