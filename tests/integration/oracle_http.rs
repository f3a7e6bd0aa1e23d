//! Integration tests for the HTTP oracle against a mock chat-completions server

use gremlin::config::AgentConfig;
use gremlin::error::{InvocationFailure, OracleError};
use gremlin::oracle::{CodeOracle, HttpOracle};
use gremlin::Agent;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn config_for(server: &MockServer) -> AgentConfig {
    AgentConfig::default()
        .endpoint(format!("{}{}", server.uri(), COMPLETIONS_PATH))
        .model("gpt-4")
        .credential("test-key")
}

#[tokio::test]
async fn test_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "max_tokens": 500,
            "temperature": 0.1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "context.value = (context.value ?? 0) + 1; return context.value;",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let agent = Agent::new("counter", config_for(&server)).unwrap();
    let reply = agent.call("increment", vec![]).await.unwrap();
    assert_eq!(reply.as_value(), Some(&json!(1)));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    let prompt = messages[0]["content"].as_str().unwrap();
    assert!(prompt.contains("Method being called: increment"));
    assert!(prompt.contains("called 'counter'"));
}

#[tokio::test]
async fn test_server_error_names_method() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = Agent::new("counter", config_for(&server)).unwrap();
    let err = agent.call("increment", vec![]).await.unwrap_err();

    assert_eq!(err.method, "increment");
    match err.cause {
        InvocationFailure::Oracle(OracleError::Status { status, ref body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        ref other => panic!("unexpected cause: {other:?}"),
    }
    assert!(err.to_string().starts_with("Failed to execute increment:"));
    assert!(agent.context().await.is_empty());
}

#[tokio::test]
async fn test_missing_content_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant" } }]
        })))
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server)).unwrap();
    let err = oracle.generate("prompt").await.unwrap_err();
    assert!(matches!(err, OracleError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server)).unwrap();
    let err = oracle.generate("prompt").await.unwrap_err();
    assert!(matches!(err, OracleError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_blank_content_is_empty_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   \n  ")))
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server)).unwrap();
    let err = oracle.generate("prompt").await.unwrap_err();
    assert!(matches!(err, OracleError::EmptyCode));
}

#[tokio::test]
async fn test_generated_code_is_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("\n\n  return 42;  \n")))
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server)).unwrap();
    let code = oracle.generate("prompt").await.unwrap();
    assert_eq!(code.as_str(), "return 42;");
}

#[tokio::test]
async fn test_no_credential_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("return 1;")))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.credential = None;
    let agent = Agent::new("anon", config).unwrap();
    agent.call("ping", vec![]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let config = AgentConfig::default()
        .endpoint("http://127.0.0.1:9/v1/chat/completions")
        .credential("test-key");
    let oracle = HttpOracle::new(&config).unwrap();
    let err = oracle.generate("prompt").await.unwrap_err();
    assert!(matches!(err, OracleError::Transport(_)));
}
