//! End-to-end probe tests against a wiremock server.
//!
//! Covers the happy test call, both fallback transitions, model-listing
//! path discovery, and hint/summary wiring.

mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{anthropic_provider, bearer_provider, options};
use llmprobe::core::pipeline::Probe;
use llmprobe::core::transport::TransportSettings;

fn probe() -> Probe {
    Probe::new(TransportSettings::default()).expect("probe")
}

// =============================================================================
// Test call
// =============================================================================

#[tokio::test]
async fn test_call_extracts_text_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "ping"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "pong"}}],
            "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11},
        })))
        .mount(&server)
        .await;

    let provider = bearer_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(record.response.ok);
    assert_eq!(record.operation, "test_call");
    assert_eq!(record.text.as_deref(), Some("pong"));
    let usage = record.usage.unwrap();
    assert_eq!(usage.total_tokens, Some(11.0));
    assert_eq!(
        record.request.headers_redacted.get("authorization").map(String::as_str),
        Some("***")
    );
    assert!(record.summary.contains("[Text] pong"));
    assert!(record.summary.contains("[Usage] in 9 / out 2 / total 11"));
}

#[tokio::test]
async fn upstream_error_lands_in_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .mount(&server)
        .await;

    let provider = bearer_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(!record.response.ok);
    assert_eq!(record.response.status, 401);
    assert_eq!(record.error_message.as_deref(), Some("bad key"));
    assert!(record.summary.contains("[Error] bad key"));
}

// =============================================================================
// Fallbacks
// =============================================================================

#[tokio::test]
async fn anthropic_404_retries_with_v1_appended() {
    let server = MockServer::start().await;
    // /messages is unmatched and 404s; only the /v1 variant answers
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "hello from v1"}],
            "usage": {"input_tokens": 5, "output_tokens": 3},
        })))
        .mount(&server)
        .await;

    let provider = anthropic_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(record.response.ok);
    assert!(record.request.url.ends_with("/v1/messages"));
    assert_eq!(record.text.as_deref(), Some("hello from v1"));
    assert!(record.summary.contains("[Note] retried with /v1 appended"));
}

#[tokio::test]
async fn failed_fallback_surfaces_the_retry_result() {
    let server = MockServer::start().await;
    // /messages is unmatched and 404s; the /v1 variant answers with a
    // credential rejection, which is the response worth reporting
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "invalid x-api-key"}})),
        )
        .mount(&server)
        .await;

    let provider = anthropic_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(!record.response.ok);
    assert_eq!(record.response.status, 401);
    assert!(record.request.url.ends_with("/v1/messages"));
    assert_eq!(record.error_message.as_deref(), Some("invalid x-api-key"));
    assert!(record.summary.contains("[Note] retried with /v1 appended"));
    assert!(record.summary.contains("still 401"));
    assert!(record.summary.contains("[Error] invalid x-api-key"));
}

#[tokio::test]
async fn fallback_that_also_404s_still_hints() {
    let server = MockServer::start().await;
    // neither /messages nor /v1/messages exists; both 404

    let provider = anthropic_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(!record.response.ok);
    assert_eq!(record.response.status, 404);
    assert!(record.request.url.ends_with("/v1/messages"));
    assert!(record.summary.contains("[Note] retried with /v1 appended"));
    assert!(record.summary.contains("still 404"));
    assert!(record.summary.contains("[Hint]"));
}

#[tokio::test]
async fn bearer_404_retries_via_responses_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "input": "ping",
            "max_output_tokens": 128,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output_text": "responses dialect",
            "usage": {"input_tokens": 4, "output_tokens": 2},
        })))
        .mount(&server)
        .await;

    // the mock base is a bare host, so the planner may switch endpoints
    let provider = bearer_provider(&server.uri());
    let record = probe().test_call(&provider, &options()).await.unwrap();

    assert!(record.response.ok);
    assert!(record.request.url.ends_with("/responses"));
    assert_eq!(record.text.as_deref(), Some("responses dialect"));
    assert!(record.summary.contains("[Note] retried via the Responses API"));
}

// =============================================================================
// Model listing
// =============================================================================

#[tokio::test]
async fn declared_listing_is_used_directly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "alpha", "context_length": 128000},
                {"id": "beta"},
            ],
        })))
        .mount(&server)
        .await;

    let provider = bearer_provider(&server.uri());
    let record = probe().list_models(&provider, &options()).await.unwrap();

    let models = record.models.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "alpha");
    assert_eq!(models[0].meta.as_deref(), Some("ctx 128k"));
    assert!(record.summary.contains("[Models] 2 available"));
}

#[tokio::test]
async fn undeclared_listing_probes_candidate_paths() {
    let server = MockServer::start().await;
    // /models 404s (unmatched); /v1/models answers
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "gamma"}]})),
        )
        .mount(&server)
        .await;

    // anthropic template declares no list_models endpoint
    let provider = anthropic_provider(&server.uri());
    let record = probe().list_models(&provider, &options()).await.unwrap();

    assert!(record.response.ok);
    assert!(record.request.url.ends_with("/v1/models"));
    assert_eq!(record.models.unwrap()[0].id, "gamma");
    assert!(record.summary.contains("[Note] no model listing declared; probed /v1/models"));
}

// =============================================================================
// Ping and full probe
// =============================================================================

#[tokio::test]
async fn ping_hits_the_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let provider = bearer_provider(&server.uri());
    let record = probe().ping(&provider, &options()).await.unwrap();

    assert!(record.response.ok);
    assert_eq!(record.operation, "ping");
    assert_eq!(record.request.method, "GET");
}

#[tokio::test]
async fn full_probe_reports_all_three_steps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "m"}]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "pong"}}],
        })))
        .mount(&server)
        .await;

    let provider = bearer_provider(&server.uri());
    let records = probe().full_probe(&provider, &options()).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].operation, "ping");
    assert_eq!(records[1].operation, "list_models");
    assert_eq!(records[2].operation, "test_call");
    assert!(records.iter().all(|r| r.response.ok));
}
