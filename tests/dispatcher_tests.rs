//! Dispatcher tests against a stubbed chat-completion endpoint.

use regex::Regex;
use serde_json::json;
use simple_translator::core::models::EMPTY_RESPONSE_PLACEHOLDER;
use simple_translator::core::translator::CREDENTIAL_REMEDIATION;
use simple_translator::{OpenAiChatClient, TranslationError, TranslationRequest, Translator};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

fn translator_for(server: &MockServer, api_key: Option<&str>) -> Translator {
    let client = OpenAiChatClient::new(
        "OpenAI",
        &server.uri(),
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap();
    Translator::new(Arc::new(client), "gpt-4o-mini")
}

fn latency_suffix() -> Regex {
    Regex::new(r"\n\n⏱️ Tiempo de inferencia: \d+ ms$").unwrap()
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_translation_is_annotated_with_latency() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "temperature": 0.0})))
        .respond_with(completion(json!("Hola")))
        .expect(1)
        .mount(&server)
        .await;

    let translator = translator_for(&server, Some("test-key"));
    let request = TranslationRequest::new("Hello")
        .with_source_lang("inglés")
        .with_target_lang("español");

    let output = translator.respond(&request).await;

    assert!(output.starts_with("Hola"), "got {:?}", output);
    assert!(latency_suffix().is_match(&output), "got {:?}", output);
}

#[tokio::test]
async fn test_request_carries_conversation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!("Hallo")))
        .mount(&server)
        .await;

    let translator = translator_for(&server, Some("test-key"));
    let request = TranslationRequest::new("Hola")
        .with_source_lang("español")
        .with_target_lang("alemán")
        .with_model("gpt-4o");

    translator.translate(&request).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();

    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(
        body["messages"][1]["content"],
        "Traduce el siguiente texto del idioma español al alemán:\n\nHola"
    );
}

#[tokio::test]
async fn test_null_content_uses_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(serde_json::Value::Null))
        .mount(&server)
        .await;

    let output = translator_for(&server, Some("test-key"))
        .respond(&TranslationRequest::new("Hello"))
        .await;

    assert!(output.starts_with(EMPTY_RESPONSE_PLACEHOLDER));
    assert!(latency_suffix().is_match(&output));
}

// =============================================================================
// No external call
// =============================================================================

#[tokio::test]
async fn test_missing_credential_makes_no_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion(json!("Hola")))
        .expect(0)
        .mount(&server)
        .await;

    let output = translator_for(&server, None)
        .respond(&TranslationRequest::new("Hello"))
        .await;

    assert!(output.starts_with("Error: No se encontró API key para OpenAI."));
    assert!(output.contains("OPENAI_API_KEY"));
    assert!(output.ends_with(CREDENTIAL_REMEDIATION));
}

#[tokio::test]
async fn test_blank_input_makes_no_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion(json!("Hola")))
        .expect(0)
        .mount(&server)
        .await;

    let output = translator_for(&server, Some("test-key"))
        .respond(&TranslationRequest::new("   "))
        .await;

    assert_eq!(output, "Por favor, ingresa un texto para traducir.");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let output = translator_for(&server, Some("test-key"))
        .respond(&TranslationRequest::new("Hello"))
        .await;

    assert_eq!(output, "Error al procesar la traducción: Error de la API: 500 - boom");
}

#[tokio::test]
async fn test_unavailable_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = translator_for(&server, Some("test-key"))
        .translate(&TranslationRequest::new("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_service_unavailable() {
    let client = OpenAiChatClient::new(
        "OpenAI",
        "http://127.0.0.1:9",
        Some("test-key".to_string()),
        Duration::from_secs(2),
    )
    .unwrap();
    let translator = Translator::new(Arc::new(client), "gpt-4o-mini");

    let err = translator
        .translate(&TranslationRequest::new("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TranslationError::ServiceUnavailable { .. } | TranslationError::TimeoutError
    ));
}

#[tokio::test]
async fn test_request_timeout_override() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!("Hola")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let request = TranslationRequest::new("Hello").with_timeout(Duration::from_millis(200));
    let err = translator_for(&server, Some("test-key"))
        .translate(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::TimeoutError));
}

#[tokio::test]
async fn test_missing_choices_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = translator_for(&server, Some("test-key"))
        .translate(&TranslationRequest::new("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::InvalidResponseError { .. }));
}

// =============================================================================
// Prompt tasks
// =============================================================================

#[tokio::test]
async fn test_run_task_uses_registered_template() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!("Hello")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = translator_for(&server, Some("test-key"))
        .run_task("Traducción", "Hola", Some("español"), None, None)
        .await
        .unwrap();

    assert_eq!(outcome.result().unwrap().translated_text, "Hello");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["messages"][1]["content"],
        "Traduce el siguiente texto de español a español:\n\nHola"
    );
}
