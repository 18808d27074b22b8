//! E-utilities client tests against a mock HTTP server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use litscout::config::Config;
use litscout::error::ClientError;
use litscout::models::RelationKind;
use litscout::provider::ArticleProvider;
use litscout::{EntrezClient, RateLimiter};

fn client_for(server: &MockServer) -> EntrezClient {
    let config = Config::for_testing(&server.uri());
    EntrezClient::new(&config, Arc::new(RateLimiter::new(config.request_delay))).unwrap()
}

fn esummary_body(id: &str) -> serde_json::Value {
    json!({
        "result": {
            "uids": [id],
            id: {
                "uid": id,
                "title": "Deep learning for protein structure prediction.",
                "authors": [
                    {"name": "Jumper J", "authtype": "Author"},
                    {"name": "Evans R", "authtype": "Author"}
                ],
                "fulljournalname": "Nature",
                "pubdate": "2021 Jul 15"
            }
        }
    })
}

#[tokio::test]
async fn test_fetch_metadata_parses_summary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("id", "34265844"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esummary_body("34265844")))
        .mount(&server)
        .await;

    let article = client_for(&server).fetch_metadata("34265844").await.unwrap();

    assert_eq!(article.id, "34265844");
    assert_eq!(article.title, "Deep learning for protein structure prediction.");
    assert_eq!(article.year, Some(2021));
    assert_eq!(article.authors, vec!["Jumper J", "Evans R"]);
    assert_eq!(article.venue, "Nature");
    assert!(article.url.contains("34265844"));
    assert!(article.abstract_text.is_empty(), "esummary carries no abstract");
}

#[tokio::test]
async fn test_fetch_metadata_unknown_id_is_not_found() {
    let server = MockServer::start().await;

    // esummary reports bad ids inside the entry, not with a 404.
    let body = json!({
        "result": {
            "uids": ["999"],
            "999": {"uid": "999", "error": "cannot get document summary"}
        }
    });

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_metadata("999").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { .. }));
}

#[tokio::test]
async fn test_fetch_metadata_missing_entry_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_metadata("123").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { .. }));
}

#[tokio::test]
async fn test_fetch_abstract_extracts_and_cleans_sections() {
    let server = MockServer::start().await;

    let xml = r#"<PubmedArticle><Abstract>
        <AbstractText Label="BACKGROUND">Protein folding is   hard.</AbstractText>
        <AbstractText Label="RESULTS">Accuracy &gt;90% &amp; robust.</AbstractText>
    </Abstract></PubmedArticle>"#;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("retmode", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(&server)
        .await;

    let text = client_for(&server).fetch_abstract("1").await.unwrap();
    assert_eq!(text, "Protein folding is hard. Accuracy >90% & robust.");
}

#[tokio::test]
async fn test_fetch_abstract_falls_back_to_other_abstract() {
    let server = MockServer::start().await;

    let xml = r#"<PubmedArticle>
        <OtherAbstract Type="plain-language-summary">
            <AbstractText>A plain summary.</AbstractText>
        </OtherAbstract>
    </PubmedArticle>"#;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(&server)
        .await;

    let text = client_for(&server).fetch_abstract("1").await.unwrap();
    assert_eq!(text, "A plain summary.");
}

#[tokio::test]
async fn test_fetch_abstract_missing_is_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<PubmedArticle></PubmedArticle>"))
        .mount(&server)
        .await;

    let text = client_for(&server).fetch_abstract("1").await.unwrap();
    assert!(text.is_empty());
}

#[tokio::test]
async fn test_fetch_related_picks_matching_linkset() {
    let server = MockServer::start().await;

    let body = json!({
        "linksets": [{
            "dbfrom": "pubmed",
            "linksetdbs": [
                {
                    "dbto": "pubmed",
                    "linkname": "pubmed_pubmed_citedin",
                    "links": [111, "222", 333]
                }
            ]
        }]
    });

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .and(query_param("linkname", "pubmed_pubmed_citedin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let ids = client_for(&server).fetch_related("1", RelationKind::CitedBy).await.unwrap();
    assert_eq!(ids, vec!["111", "222", "333"]);
}

#[tokio::test]
async fn test_fetch_related_no_links_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"linksets": [{"dbfrom": "pubmed"}]})),
        )
        .mount(&server)
        .await;

    let ids = client_for(&server).fetch_related("1", RelationKind::Similar).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_metadata("1").await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, ClientError::Server { status: 500, .. }));
}

#[tokio::test]
async fn test_http_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_metadata("1").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_api_key_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("api_key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esummary_body("1")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::for_testing(&server.uri());
    config.ncbi_api_key = Some("secret".to_string());
    let client =
        EntrezClient::new(&config, Arc::new(RateLimiter::new(config.request_delay))).unwrap();

    client.fetch_metadata("1").await.unwrap();
}

#[tokio::test]
async fn test_requests_are_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<PubmedArticle></PubmedArticle>"))
        .mount(&server)
        .await;

    let config = Config::for_testing(&server.uri());
    let delay = Duration::from_millis(50);
    let client = EntrezClient::new(&config, Arc::new(RateLimiter::new(delay))).unwrap();

    let start = Instant::now();
    for _ in 0..4 {
        client.fetch_abstract("1").await.unwrap();
    }

    // Four calls sharing one limiter spend at least three full intervals.
    assert!(start.elapsed() >= delay * 3, "elapsed {:?}", start.elapsed());
}
