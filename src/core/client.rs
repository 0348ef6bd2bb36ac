//! Chat-completion HTTP client

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{ChatCompletionRequest, ChatCompletionResponse};
use crate::core::providers::ProviderConfig;

/// Hint attached to a missing OpenAI key
pub const OPENAI_CREDENTIAL_HINT: &str =
    "Exporta OPENAI_API_KEY o API_KEY, o monta el secret en /run/secrets/openai_api_key.";

/// Sends a conversation to a model and returns the first choice's content.
///
/// `Ok(None)` means the model answered without content.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Option<String>>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
    api_key: Option<String>,
    credential_hint: String,
}

impl OpenAiChatClient {
    /// Create a client for `base_url`; a missing key is reported per call
    pub fn new(
        provider: impl Into<String>,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(TranslationError::ConfigError {
                message: "API endpoint is required".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            provider: provider.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            credential_hint: OPENAI_CREDENTIAL_HINT.to_string(),
        })
    }

    /// Client for the OpenAI endpoint described by `config`
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        Self::new(
            "OpenAI",
            &config.api_endpoint,
            config.api_key.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Client for a registry provider
    pub fn for_provider(provider: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let mut client = Self::new(
            provider.name.clone(),
            &provider.base_url,
            provider.api_key.clone(),
            timeout,
        )?;
        client.credential_hint = provider.credential_hint();
        Ok(client)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TranslationError::MissingCredential {
                provider: self.provider.clone(),
                hint: self.credential_hint.clone(),
            })?;

        debug!("POST {} model={}", self.endpoint, request.model);

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TranslationError::TimeoutError
            } else {
                TranslationError::ServiceUnavailable {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();

        if status.is_success() {
            let body: ChatCompletionResponse =
                response
                    .json()
                    .await
                    .map_err(|e| TranslationError::InvalidResponseError {
                        message: e.to_string(),
                    })?;

            let choice = body.choices.into_iter().next().ok_or_else(|| {
                TranslationError::InvalidResponseError {
                    message: "No choices in response".to_string(),
                }
            })?;

            Ok(choice.message.content)
        } else {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            warn!("{} answered {}: {}", self.provider, status_code, error_text);

            match status_code {
                502 | 503 | 504 => Err(TranslationError::ServiceUnavailable {
                    message: format!("HTTP {}: {}", status_code, error_text),
                }),
                _ => Err(TranslationError::ApiError {
                    status: status_code,
                    message: error_text,
                }),
            }
        }
    }
}
