//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Message shown when there is nothing to translate
pub const EMPTY_INPUT_MESSAGE: &str = "Por favor, ingresa un texto para traducir.";

/// Placeholder used when the model answers with no content
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "(respuesta vacía)";

/// Default source language of a translation request
pub const DEFAULT_SOURCE_LANG: &str = "auto";

/// Default target language of a translation request
pub const DEFAULT_TARGET_LANG: &str = "español";

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// User input
    User,
    /// Model output
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The system + user pair sent to the model.
///
/// Only the two contents are stored so a conversation can never be built
/// with the roles swapped or with a different number of messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    system: String,
    user: String,
}

impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Messages in wire order: system first, then user
    pub fn messages(&self) -> [Message; 2] {
        [
            Message {
                role: Role::System,
                content: self.system.clone(),
            },
            Message {
                role: Role::User,
                content: self.user.clone(),
            },
        ]
    }
}

impl Serialize for Conversation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.messages().serialize(serializer)
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Conversation,
    pub temperature: f32,
}

impl ChatCompletionRequest {
    /// Build a deterministic (temperature 0) request
    pub fn new(model: impl Into<String>, conversation: Conversation) -> Self {
        Self {
            model: model.into(),
            messages: conversation,
            temperature: 0.0,
        }
    }
}

/// Chat completion response body, reduced to the fields we read
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

fn default_source_lang() -> String {
    DEFAULT_SOURCE_LANG.to_string()
}

fn default_target_lang() -> String {
    DEFAULT_TARGET_LANG.to_string()
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            model: None,
            timeout: None,
        }
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }

    pub fn with_target_lang(mut self, target_lang: impl Into<String>) -> Self {
        self.target_lang = target_lang.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// True when the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Translation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub elapsed_ms: u64,
    pub model_used: String,
}

impl TranslationResult {
    /// Text followed by the latency annotation shown in the UI
    pub fn render(&self) -> String {
        format!(
            "{}\n\n⏱️ Tiempo de inferencia: {} ms",
            self.translated_text, self.elapsed_ms
        )
    }
}

/// Outcome of a dispatch that did not fail
#[derive(Debug, Clone)]
pub enum TranslationOutcome {
    /// Blank input, no call was made
    NoInput,
    /// The model answered
    Completed(TranslationResult),
}

impl TranslationOutcome {
    pub fn render(&self) -> String {
        match self {
            TranslationOutcome::NoInput => EMPTY_INPUT_MESSAGE.to_string(),
            TranslationOutcome::Completed(result) => result.render(),
        }
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        match self {
            TranslationOutcome::NoInput => None,
            TranslationOutcome::Completed(result) => Some(result),
        }
    }
}
