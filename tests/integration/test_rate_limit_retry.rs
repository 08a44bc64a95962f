//! Backoff behavior against a mocked rate-limiting EFetch endpoint

use pubmed_retriever::{ClientConfig, PubMedRetriever, RetrieverError, RetryConfig};
use std::time::{Duration, Instant};
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_XML: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
<PubmedArticle>
    <MedlineCitation>
        <Article>
            <ArticleTitle>Recovered</ArticleTitle>
            <Abstract><AbstractText>Made it through.</AbstractText></Abstract>
        </Article>
    </MedlineCitation>
</PubmedArticle>
</PubmedArticleSet>"#;

const CITATION_JSON: &str = r#"{"ama": {"format": "ama", "orig": "A citation."}}"#;

fn create_test_retriever(mock_server: &MockServer, initial_delay: Duration) -> PubMedRetriever {
    let config = ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_citation_base_url(format!("{}/ctxp/", mock_server.uri()))
        .with_rate_limit(1000.0)
        .with_retry_config(RetryConfig::new().with_initial_delay(initial_delay));
    PubMedRetriever::with_config(config)
}

async fn efetch_request_count(mock_server: &MockServer) -> usize {
    mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/efetch.fcgi")
        .count()
}

#[tokio::test]
#[traced_test]
async fn test_rate_limited_fetch_recovers_on_fourth_attempt() {
    let mock_server = MockServer::start().await;

    // First three EFetch attempts are throttled, the fourth succeeds
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_XML))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ctxp/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CITATION_JSON))
        .mount(&mock_server)
        .await;

    let base_delay = Duration::from_millis(20);
    let retriever = create_test_retriever(&mock_server, base_delay);

    let start = Instant::now();
    let detail = retriever
        .fetch_article("111", "MCID_session")
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(detail.title, "Recovered");
    assert_eq!(detail.citation, "A citation.");
    assert_eq!(efetch_request_count(&mock_server).await, 4);
    // Backoff doubles: 20ms + 40ms + 80ms before the successful attempt
    assert!(
        elapsed >= Duration::from_millis(140),
        "expected at least 140ms of backoff, got {:?}",
        elapsed
    );
}

#[tokio::test]
#[traced_test]
async fn test_rate_limit_ceiling_surfaces_original_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let retriever = create_test_retriever(&mock_server, Duration::from_millis(1));

    let result = retriever.fetch_article("111", "MCID_session").await;

    assert!(matches!(result, Err(RetrieverError::RateLimitExceeded)));
    // Attempt ceiling is five attempts total
    assert_eq!(efetch_request_count(&mock_server).await, 5);
}

#[tokio::test]
#[traced_test]
async fn test_other_transport_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let retriever = create_test_retriever(&mock_server, Duration::from_millis(1));

    let result = retriever.fetch_article("111", "MCID_session").await;

    assert!(matches!(
        result,
        Err(RetrieverError::ApiError { status: 500, .. })
    ));
    assert_eq!(efetch_request_count(&mock_server).await, 1);
}

#[tokio::test]
#[traced_test]
async fn test_rate_limited_identifier_is_skipped_not_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "esearchresult": {
                    "count": "1",
                    "webenv": "MCID_abc",
                    "querykey": "1",
                    "idlist": ["111"]
                }
            }"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let retriever = create_test_retriever(&mock_server, Duration::from_millis(1));

    // Retries exhaust for the only identifier; the run itself still succeeds
    let docs = retriever.run("query", 1).await.unwrap();
    assert!(docs.is_empty());
}
