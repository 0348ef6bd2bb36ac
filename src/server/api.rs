//! HTTP server: translation web page and JSON API

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::TranslationError;
use crate::core::models::{Conversation, TranslationRequest, DEFAULT_TARGET_LANG};
use crate::core::prompts::AVAILABLE_LANGUAGES;
use crate::core::providers::ProviderRegistry;
use crate::core::translator::{error_message, Translator};

/// Languages offered by the web page; the first entry is source-only
pub const UI_LANGUAGES: &[&str] = &[
    "auto",
    "español",
    "inglés",
    "francés",
    "alemán",
    "italiano",
    "portugués",
    "chino",
];

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Traductor - Desarrollo local</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
textarea { width: 100%; }
.row { margin: 1rem 0; }
</style>
</head>
<body>
<h1>Traductor simple (local)</h1>
<div class="row"><label>Texto a traducir<br><textarea id="text" rows="6"></textarea></label></div>
<div class="row">
<label>Idioma origen <select id="source">__SOURCE_OPTIONS__</select></label>
<label>Idioma destino <select id="target">__TARGET_OPTIONS__</select></label>
</div>
<button id="go">Traducir</button>
<div class="row"><label>Traducción<br><textarea id="output" rows="6" readonly></textarea></label></div>
<script>
document.getElementById("go").addEventListener("click", async () => {
  const output = document.getElementById("output");
  output.value = "...";
  try {
    const res = await fetch("/v1/translate", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({
        text: document.getElementById("text").value,
        source_lang: document.getElementById("source").value,
        target_lang: document.getElementById("target").value,
      }),
    });
    const body = await res.json();
    output.value = body.output;
  } catch (e) {
    output.value = "Error al procesar la traducción: " + e;
  }
});
</script>
</body>
</html>
"#;

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: Arc<Translator>,
    providers: Arc<ProviderRegistry>,
}

impl AppState {
    pub fn new(translator: Translator, providers: ProviderRegistry) -> Self {
        Self {
            translator: Arc::new(translator),
            providers: Arc::new(providers),
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    default_model: String,
    tracking: bool,
}

/// Providers list response
#[derive(Serialize)]
struct ProvidersResponse {
    object: String,
    data: Vec<ProviderInfo>,
}

#[derive(Serialize)]
struct ProviderInfo {
    name: String,
    base_url: String,
    models: Vec<String>,
    has_credential: bool,
}

#[derive(Serialize)]
struct TasksResponse {
    tasks: Vec<String>,
}

#[derive(Serialize)]
struct LanguagesResponse {
    source: Vec<String>,
    target: Vec<String>,
    default_target: String,
    prompt: Vec<String>,
}

/// Display output of a translation or task
#[derive(Serialize, Deserialize)]
pub struct TranslateResponse {
    pub output: String,
}

/// Prompt formatting request
#[derive(Deserialize)]
pub struct PromptRequest {
    pub task: String,
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Serialize)]
pub struct PromptResponse {
    pub task: String,
    pub messages: Conversation,
}

/// Prompt task request
#[derive(Deserialize)]
pub struct TaskRequest {
    pub task: String,
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub model: Option<String>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

type ApiError = (StatusCode, axum::Json<ErrorResponse>);

fn unknown_task(err: TranslationError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(ErrorResponse {
            error: ErrorDetail {
                message: err.to_string(),
                code: Some("unknown_task".to_string()),
                r#type: Some("invalid_request_error".to_string()),
            },
        }),
    )
}

fn render_options(languages: &[&str], selected: &str) -> String {
    languages
        .iter()
        .map(|lang| {
            if *lang == selected {
                format!("<option selected>{}</option>", lang)
            } else {
                format!("<option>{}</option>", lang)
            }
        })
        .collect()
}

/// Translation page handler
async fn index() -> Html<String> {
    Html(
        INDEX_TEMPLATE
            .replace("__SOURCE_OPTIONS__", &render_options(UI_LANGUAGES, "auto"))
            .replace(
                "__TARGET_OPTIONS__",
                &render_options(&UI_LANGUAGES[1..], DEFAULT_TARGET_LANG),
            ),
    )
}

/// Health check handler
async fn health_check(State(state): State<Arc<AppState>>) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_model: state.translator.default_model().to_string(),
        tracking: state.translator.has_telemetry(),
    })
}

/// Get providers handler
async fn get_providers(State(state): State<Arc<AppState>>) -> axum::Json<ProvidersResponse> {
    let data = state
        .providers
        .iter()
        .map(|p| ProviderInfo {
            name: p.name.clone(),
            base_url: p.base_url.clone(),
            models: p.models.clone(),
            has_credential: p.has_credential(),
        })
        .collect();

    axum::Json(ProvidersResponse {
        object: "list".to_string(),
        data,
    })
}

async fn get_tasks(State(state): State<Arc<AppState>>) -> axum::Json<TasksResponse> {
    axum::Json(TasksResponse {
        tasks: state.translator.prompts().get_all_tasks(),
    })
}

async fn get_languages() -> axum::Json<LanguagesResponse> {
    let owned = |langs: &[&str]| langs.iter().map(|l| l.to_string()).collect::<Vec<_>>();

    axum::Json(LanguagesResponse {
        source: owned(UI_LANGUAGES),
        target: owned(&UI_LANGUAGES[1..]),
        default_target: DEFAULT_TARGET_LANG.to_string(),
        prompt: owned(AVAILABLE_LANGUAGES),
    })
}

/// Translation handler; failures, malformed bodies included, are reported
/// in `output` with status 200
async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> axum::Json<TranslateResponse> {
    let output = match payload {
        Ok(Json(request)) => state.translator.respond(&request).await,
        Err(rejection) => error_message(&TranslationError::InvalidRequest {
            message: rejection.body_text(),
        }),
    };

    axum::Json(TranslateResponse { output })
}

/// Prompt formatting handler
async fn format_prompt(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PromptRequest>,
) -> Result<axum::Json<PromptResponse>, ApiError> {
    let messages = state
        .translator
        .prompts()
        .format_prompt(
            &payload.task,
            &payload.text,
            payload.source_lang.as_deref(),
            payload.target_lang.as_deref(),
        )
        .map_err(unknown_task)?;

    Ok(axum::Json(PromptResponse {
        task: payload.task,
        messages,
    }))
}

/// Prompt task handler
async fn run_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TaskRequest>,
) -> Result<axum::Json<TranslateResponse>, ApiError> {
    let result = state
        .translator
        .run_task(
            &payload.task,
            &payload.text,
            payload.source_lang.as_deref(),
            payload.target_lang.as_deref(),
            payload.model.as_deref(),
        )
        .await;

    let output = match result {
        Ok(outcome) => outcome.render(),
        Err(e @ TranslationError::UnknownTask { .. }) => {
            warn!("Rejected task request: {}", e);
            return Err(unknown_task(e));
        }
        Err(e) => error_message(&e),
    };

    Ok(axum::Json(TranslateResponse { output }))
}

/// Router with every route mounted
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/v1/providers", get(get_providers))
        .route("/v1/tasks", get(get_tasks))
        .route("/v1/languages", get(get_languages))
        .route("/v1/translate", post(translate))
        .route("/v1/prompt", post(format_prompt))
        .route("/v1/tasks/run", post(run_task))
        .with_state(Arc::new(state))
}

/// Run the HTTP server; `api_key` overrides secrets and environment
pub async fn run_server(
    host: String,
    port: u16,
    provider: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let config = TranslatorConfig::from_env_with_key(api_key)?;
    let providers = ProviderRegistry::from_env();

    let translator = Translator::resolve(&config, &providers, provider.as_deref()).await?;
    let app = router(AppState::new(translator, providers));

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
