//! Best-effort experiment tracking (MLflow REST API)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::TrackingConfig;
use crate::core::errors::{Result, TranslationError};

/// Artifacts are truncated to this many characters
pub const MAX_ARTIFACT_CHARS: usize = 4000;

/// Parameters and artifacts of one dispatch
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub component: String,
    pub model: String,
    pub source_lang: String,
    pub target_lang: String,
    pub text_length: usize,
    pub inference_ms: u64,
    pub input_text: String,
    pub output_text: String,
}

/// Destination for run records
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, run: &RunRecord) -> Result<()>;
}

/// Record `run`, logging and discarding any failure
pub async fn record_best_effort(sink: &dyn TelemetrySink, run: &RunRecord) {
    if let Err(e) = sink.record(run).await {
        warn!("Telemetry dropped for {}: {}", run.component, e);
    }
}

/// First `max_chars` characters of `text`
pub fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Deserialize)]
struct CreateRunResponse {
    run: RunPayload,
}

#[derive(Deserialize)]
struct RunPayload {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
    experiment_id: String,
}

/// MLflow tracking server sink
#[derive(Debug, Clone)]
pub struct MlflowSink {
    client: reqwest::Client,
    tracking_uri: String,
    experiment_id: String,
}

impl MlflowSink {
    pub fn new(tracking_uri: &str, experiment_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            tracking_uri: tracking_uri.trim_end_matches('/').to_string(),
            experiment_id: experiment_id.into(),
        })
    }

    /// Sink for `config` if tracking is enabled and the server answers
    /// its health check; `None` otherwise.
    pub async fn connect(config: &TrackingConfig) -> Option<Self> {
        let uri = config.uri.as_deref()?;

        let sink = match Self::new(uri, config.experiment_id.clone()) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Tracking disabled: {}", e);
                return None;
            }
        };

        match sink.health().await {
            Ok(()) => {
                info!("Tracking runs to {} (experiment {})", uri, sink.experiment_id);
                Some(sink)
            }
            Err(e) => {
                warn!("Tracking server {} unreachable, tracking disabled: {}", uri, e);
                None
            }
        }
    }

    async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.tracking_uri))
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/api/2.0/mlflow/{}", self.tracking_uri, path))
            .json(&body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn create_run(&self, component: &str) -> Result<RunInfo> {
        let response = self
            .post(
                "runs/create",
                json!({
                    "experiment_id": self.experiment_id,
                    "start_time": chrono::Utc::now().timestamp_millis(),
                    "tags": [{"key": "component", "value": component}],
                }),
            )
            .await?;

        let created: CreateRunResponse =
            response
                .json()
                .await
                .map_err(|e| TranslationError::TelemetryError {
                    message: format!("invalid runs/create response: {}", e),
                })?;

        Ok(created.run.info)
    }

    async fn log_batch(&self, run_id: &str, run: &RunRecord) -> Result<()> {
        self.post(
            "runs/log-batch",
            json!({
                "run_id": run_id,
                "params": [
                    {"key": "model", "value": run.model},
                    {"key": "source_lang", "value": run.source_lang},
                    {"key": "target_lang", "value": run.target_lang},
                    {"key": "text_length", "value": run.text_length.to_string()},
                ],
                "metrics": [{
                    "key": "inference_ms",
                    "value": run.inference_ms,
                    "timestamp": chrono::Utc::now().timestamp_millis(),
                    "step": 0,
                }],
                "tags": [{"key": "component", "value": run.component}],
            }),
        )
        .await
        .map(|_| ())
    }

    async fn log_text(&self, info: &RunInfo, text: &str, artifact_path: &str) -> Result<()> {
        let url = format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{}/{}/artifacts/{}",
            self.tracking_uri, info.experiment_id, info.run_id, artifact_path
        );

        let response = self
            .client
            .put(url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(snippet(text, MAX_ARTIFACT_CHARS).to_string())
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn end_run(&self, run_id: &str, status: &str) -> Result<()> {
        self.post(
            "runs/update",
            json!({
                "run_id": run_id,
                "status": status,
                "end_time": chrono::Utc::now().timestamp_millis(),
            }),
        )
        .await
        .map(|_| ())
    }

    async fn log_run(&self, info: &RunInfo, run: &RunRecord) -> Result<()> {
        self.log_batch(&info.run_id, run).await?;

        // Artifacts are optional: a store without artifact proxying still
        // gets params and metrics.
        for (text, path) in [
            (run.input_text.as_str(), "input_text.txt"),
            (run.output_text.as_str(), "translated_text.txt"),
        ] {
            if let Err(e) = self.log_text(info, text, path).await {
                debug!("Artifact {} not stored: {}", path, e);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for MlflowSink {
    async fn record(&self, run: &RunRecord) -> Result<()> {
        let info = self.create_run(&run.component).await?;

        let logged = self.log_run(&info, run).await;
        let status = if logged.is_ok() { "FINISHED" } else { "FAILED" };
        let closed = self.end_run(&info.run_id, status).await;

        logged.and(closed)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TranslationError::TelemetryError {
        message: format!("HTTP {}: {}", status.as_u16(), body),
    })
}
