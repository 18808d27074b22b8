//! Relevance scorer tests against a mock generateContent endpoint.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use litscout::config::Config;
use litscout::error::EvalError;
use litscout::provider::RelevanceScorer;
use litscout::GeminiScorer;

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_evaluate_parses_score_and_reasoning() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(body_string_contains("machine learning for drug discovery"))
        .and(body_string_contains("A Study of Kinase Inhibitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "Score: 85\nReasoning: Directly investigates the requested compound class.",
        )))
        .mount(&server)
        .await;

    let scorer = GeminiScorer::new(&Config::for_testing(&server.uri())).unwrap();
    let evaluation = scorer
        .evaluate(
            "machine learning for drug discovery",
            "A Study of Kinase Inhibitors",
            "We apply neural networks to kinase inhibitor screening.",
        )
        .await
        .unwrap();

    assert_eq!(evaluation.score, 85);
    assert_eq!(evaluation.justification, "Directly investigates the requested compound class.");
}

#[tokio::test]
async fn test_evaluate_sends_api_key_as_query_param() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Score: 10\nReasoning: no.")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::for_testing(&server.uri());
    config.gemini_api_key = Some("secret".to_string());

    let scorer = GeminiScorer::new(&config).unwrap();
    scorer.evaluate("theme", "title", "abstract").await.unwrap();
}

#[tokio::test]
async fn test_evaluate_unparseable_reply_defaults_to_neutral() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply("I cannot rate this article.")),
        )
        .mount(&server)
        .await;

    let scorer = GeminiScorer::new(&Config::for_testing(&server.uri())).unwrap();
    let evaluation = scorer.evaluate("theme", "title", "abstract").await.unwrap();

    assert_eq!(evaluation.score, 50);
}

#[tokio::test]
async fn test_evaluate_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let scorer = GeminiScorer::new(&Config::for_testing(&server.uri())).unwrap();
    let err = scorer.evaluate("theme", "title", "abstract").await.unwrap_err();

    assert!(matches!(err, EvalError::Server { status: 429, .. }));
}

#[tokio::test]
async fn test_evaluate_empty_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let scorer = GeminiScorer::new(&Config::for_testing(&server.uri())).unwrap();
    let err = scorer.evaluate("theme", "title", "abstract").await.unwrap_err();

    assert!(matches!(err, EvalError::EmptyResponse));
}

#[tokio::test]
async fn test_evaluate_blank_text_part() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("")))
        .mount(&server)
        .await;

    let scorer = GeminiScorer::new(&Config::for_testing(&server.uri())).unwrap();
    let err = scorer.evaluate("theme", "title", "abstract").await.unwrap_err();

    assert!(matches!(err, EvalError::EmptyResponse));
}
