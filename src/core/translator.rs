//! Translation dispatcher: prompt → model call → optional tracking

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::client::{ChatClient, OpenAiChatClient};
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{
    ChatCompletionRequest, Conversation, TranslationOutcome, TranslationRequest,
    TranslationResult, EMPTY_RESPONSE_PLACEHOLDER,
};
use crate::core::prompts::PromptRegistry;
use crate::core::providers::{ProviderConfig, ProviderRegistry};
use crate::core::telemetry::{record_best_effort, MlflowSink, RunRecord, TelemetrySink};

const TRANSLATE_SYSTEM_PROMPT: &str =
    "Eres un asistente de traducción. Devuelve únicamente el texto traducido, sin comentarios.";

/// Longest a dispatch waits for telemetry before answering; a slower
/// recording keeps running in the background.
pub const TELEMETRY_BUDGET: Duration = Duration::from_secs(2);

/// Appended to credential errors at the UI boundary
pub const CREDENTIAL_REMEDIATION: &str =
    "Asegúrate de exportar la API key o crear el secret en Swarm.";

/// Dispatches translation and prompt-task requests to a chat model.
///
/// Cheap to clone; every field is shared and read-only.
#[derive(Clone)]
pub struct Translator {
    client: Arc<dyn ChatClient>,
    default_model: String,
    prompts: Arc<PromptRegistry>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    telemetry_budget: Duration,
}

impl Translator {
    pub fn new(client: Arc<dyn ChatClient>, default_model: impl Into<String>) -> Self {
        Self {
            client,
            default_model: default_model.into(),
            prompts: Arc::new(PromptRegistry::default()),
            telemetry: None,
            telemetry_budget: TELEMETRY_BUDGET,
        }
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn with_telemetry_budget(mut self, budget: Duration) -> Self {
        self.telemetry_budget = budget;
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<PromptRegistry>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Translator for the OpenAI endpoint, tracking runs when configured
    pub async fn from_config(config: &TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = OpenAiChatClient::from_config(config)?;
        let translator = Self::new(Arc::new(client), config.default_model.clone());

        Ok(translator.attach_tracking(config).await)
    }

    /// Translator for a registry provider, defaulting to its first model
    pub async fn for_provider(provider: &ProviderConfig, config: &TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client =
            OpenAiChatClient::for_provider(provider, Duration::from_millis(config.timeout_ms))?;
        let default_model = provider
            .default_model()
            .unwrap_or(config.default_model.as_str())
            .to_string();
        let translator = Self::new(Arc::new(client), default_model);

        Ok(translator.attach_tracking(config).await)
    }

    /// OpenAI translator, or the named registry provider when given
    pub async fn resolve(
        config: &TranslatorConfig,
        providers: &ProviderRegistry,
        provider: Option<&str>,
    ) -> Result<Self> {
        match provider {
            None => Self::from_config(config).await,
            Some(name) => {
                let provider = providers
                    .find(name)
                    .ok_or_else(|| TranslationError::UnknownProvider {
                        name: name.to_string(),
                    })?;
                info!("Using provider {} at {}", provider.name, provider.base_url);
                Self::for_provider(provider, config).await
            }
        }
    }

    async fn attach_tracking(self, config: &TranslatorConfig) -> Self {
        match MlflowSink::connect(&config.tracking).await {
            Some(sink) => self.with_telemetry(Arc::new(sink)),
            None => self,
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    pub fn has_telemetry(&self) -> bool {
        self.telemetry.is_some()
    }

    /// Translate `request.text` from `source_lang` into `target_lang`
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationOutcome> {
        if request.is_blank() {
            return Ok(TranslationOutcome::NoInput);
        }

        let conversation = Conversation::new(
            TRANSLATE_SYSTEM_PROMPT,
            format!(
                "Traduce el siguiente texto del idioma {} al {}:\n\n{}",
                request.source_lang, request.target_lang, request.text
            ),
        );

        self.dispatch(
            "translator.translate",
            conversation,
            request.model.as_deref(),
            request.timeout,
            &request.text,
            &request.source_lang,
            &request.target_lang,
        )
        .await
    }

    /// Run any registered prompt task on `text`
    pub async fn run_task(
        &self,
        task_name: &str,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
        model: Option<&str>,
    ) -> Result<TranslationOutcome> {
        let conversation = self
            .prompts
            .format_prompt(task_name, text, source_lang, target_lang)?;

        if text.trim().is_empty() {
            return Ok(TranslationOutcome::NoInput);
        }

        let (source_lang, target_lang) = self
            .prompts
            .get(task_name)
            .and_then(|task| task.languages(source_lang, target_lang))
            .unwrap_or(("", ""));

        self.dispatch(
            "translator.run_task",
            conversation,
            model,
            None,
            text,
            source_lang,
            target_lang,
        )
        .await
    }

    /// Translate and turn every outcome into a display string
    pub async fn respond(&self, request: &TranslationRequest) -> String {
        match self.translate(request).await {
            Ok(outcome) => outcome.render(),
            Err(e) => error_message(&e),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        component: &str,
        conversation: Conversation,
        model: Option<&str>,
        timeout: Option<Duration>,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutcome> {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string();
        let chat_request = ChatCompletionRequest::new(model.clone(), conversation);

        let start = Instant::now();
        let response = self.client.complete(&chat_request, timeout).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let content = match response {
            Ok(content) => content,
            Err(e) => {
                warn!("{} with {} failed after {} ms: {}", component, model, elapsed_ms, e);
                return Err(e);
            }
        };
        info!("{} with {} took {} ms", component, model, elapsed_ms);

        let translated_text = content
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_RESPONSE_PLACEHOLDER.to_string());

        if let Some(sink) = &self.telemetry {
            let run = RunRecord {
                component: component.to_string(),
                model: model.clone(),
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                text_length: text.chars().count(),
                inference_ms: elapsed_ms,
                input_text: text.to_string(),
                output_text: content.unwrap_or_default(),
            };
            self.record(Arc::clone(sink), run).await;
        }

        Ok(TranslationOutcome::Completed(TranslationResult {
            translated_text,
            elapsed_ms,
            model_used: model,
        }))
    }
}

impl Translator {
    /// Record `run` on its own task and wait at most the telemetry budget
    async fn record(&self, sink: Arc<dyn TelemetrySink>, run: RunRecord) {
        let component = run.component.clone();
        let handle = tokio::spawn(async move {
            record_best_effort(&*sink, &run).await;
        });

        match tokio::time::timeout(self.telemetry_budget, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Telemetry task for {} aborted: {}", component, e),
            Err(_) => warn!(
                "Telemetry for {} still running after {} ms, not waiting",
                component,
                self.telemetry_budget.as_millis()
            ),
        }
    }
}

/// Readable form of a dispatch error for the UI
pub fn error_message(err: &TranslationError) -> String {
    if err.is_missing_credential() {
        let msg = format!("Error: {}\n\n{}", err, CREDENTIAL_REMEDIATION);
        warn!("{}", msg);
        msg
    } else {
        warn!("Translation failed: {}", err);
        format!("Error al procesar la traducción: {}", err)
    }
}
