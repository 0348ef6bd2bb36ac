//! HTTP API tests: the router is served on an ephemeral port and driven
//! with reqwest.

use assert_json_diff::{assert_json_eq, assert_json_include};
use serde_json::json;
use simple_translator::server::api::{router, AppState};
use simple_translator::{OpenAiChatClient, ProviderConfig, ProviderRegistry, Translator};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(translator: Translator) -> String {
    let providers = ProviderRegistry::new(vec![ProviderConfig {
        name: "Groq".to_string(),
        base_url: "https://api.groq.com/openai/v1".to_string(),
        api_key: None,
        credential_var: "GROQ_API_KEY".to_string(),
        models: vec!["llama-3.1-8b-instant".to_string()],
    }]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(translator, providers));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn translator_for(model_uri: &str, api_key: Option<&str>) -> Translator {
    let client = OpenAiChatClient::new(
        "OpenAI",
        model_uri,
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap();
    Translator::new(Arc::new(client), "gpt-4o-mini")
}

async fn model_server(answer: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": answer}}]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_index_page() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert!(response.status().is_success());

    let page = response.text().await.unwrap();
    assert!(page.contains("Traductor simple (local)"));
    assert!(page.contains("<option selected>español</option>"));
}

#[tokio::test]
async fn test_health() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_json_include!(
        actual: body,
        expected: json!({"status": "ok", "default_model": "gpt-4o-mini", "tracking": false})
    );
}

#[tokio::test]
async fn test_translate_endpoint() {
    let model = model_server("Hola").await;
    let base = spawn_app(translator_for(&model.uri(), Some("test-key"))).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/v1/translate", base))
        .json(&json!({"text": "Hello", "source_lang": "inglés", "target_lang": "español"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let output = body["output"].as_str().unwrap();
    assert!(output.starts_with("Hola\n\n⏱️ Tiempo de inferencia: "));
    assert!(output.ends_with(" ms"));
}

#[tokio::test]
async fn test_translate_endpoint_reports_missing_key_as_text() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/translate", base))
        .json(&json!({"text": "Hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["output"].as_str().unwrap().contains("secret"));
}

#[tokio::test]
async fn test_translate_without_text_asks_for_input() {
    let model = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&model)
        .await;
    let base = spawn_app(translator_for(&model.uri(), Some("test-key"))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/translate", base))
        .json(&json!({"source_lang": "inglés"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_json_eq!(
        body,
        json!({"output": "Por favor, ingresa un texto para traducir."})
    );
}

#[tokio::test]
async fn test_translate_malformed_body_is_reported_as_text() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", Some("test-key"))).await;
    let client = reqwest::Client::new();

    let wrong_type = client
        .post(format!("{}/v1/translate", base))
        .json(&json!({"text": 5}))
        .send()
        .await
        .unwrap();
    let not_json = client
        .post(format!("{}/v1/translate", base))
        .body("text=Hello")
        .send()
        .await
        .unwrap();

    for response in [wrong_type, not_json] {
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["output"]
            .as_str()
            .unwrap()
            .starts_with("Error al procesar la traducción: Solicitud inválida"));
    }
}

#[tokio::test]
async fn test_lists() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let tasks: serde_json::Value = reqwest::get(format!("{}/v1/tasks", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_json_eq!(tasks, json!({"tasks": ["Traducción", "Resumen", "VQA"]}));

    let providers: serde_json::Value = reqwest::get(format!("{}/v1/providers", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_json_eq!(
        providers,
        json!({
            "object": "list",
            "data": [{
                "name": "Groq",
                "base_url": "https://api.groq.com/openai/v1",
                "models": ["llama-3.1-8b-instant"],
                "has_credential": false
            }]
        })
    );

    let languages: serde_json::Value = reqwest::get(format!("{}/v1/languages", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(languages["source"][0], "auto");
    assert_eq!(languages["target"][0], "español");
    assert_eq!(languages["default_target"], "español");
}

#[tokio::test]
async fn test_prompt_endpoint() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/v1/prompt", base))
        .json(&json!({"task": "Traducción", "text": "Hello"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_json_include!(
        actual: body,
        expected: json!({
            "task": "Traducción",
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "Traduce el siguiente texto de inglés a español:\n\nHello"}
            ]
        })
    );
}

#[tokio::test]
async fn test_prompt_endpoint_unknown_task() {
    let base = spawn_app(translator_for("http://127.0.0.1:9", None)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/prompt", base))
        .json(&json!({"task": "Poesía", "text": "Hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_json_eq!(
        body,
        json!({
            "error": {
                "message": "Tarea 'Poesía' no encontrada",
                "code": "unknown_task",
                "type": "invalid_request_error"
            }
        })
    );
}

#[tokio::test]
async fn test_run_task_endpoint() {
    let model = model_server("Resumen breve").await;
    let base = spawn_app(translator_for(&model.uri(), Some("test-key"))).await;
    let client = reqwest::Client::new();

    let ok: serde_json::Value = client
        .post(format!("{}/v1/tasks/run", base))
        .json(&json!({"task": "Resumen", "text": "Un texto largo."}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(ok["output"].as_str().unwrap().starts_with("Resumen breve"));

    let rejected = client
        .post(format!("{}/v1/tasks/run", base))
        .json(&json!({"task": "Poesía", "text": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);
}
