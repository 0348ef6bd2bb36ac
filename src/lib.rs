//! Simple Translator - minimal web UI over LLM chat-completion APIs
//!
//! This library forwards text to an OpenAI-compatible chat endpoint for
//! translation, with a prompt-task registry, a provider registry and optional
//! MLflow run tracking.

#![forbid(unsafe_code)]

pub mod core;
pub mod server;
pub mod cli;

// Re-export key types for convenience
pub use core::{
    client::{ChatClient, OpenAiChatClient},
    config::{CredentialSource, TrackingConfig, TranslatorConfig},
    errors::TranslationError,
    models::{Conversation, Message, Role, TranslationOutcome, TranslationRequest, TranslationResult},
    prompts::{PromptRegistry, TaskPrompt},
    providers::{ProviderConfig, ProviderRegistry},
    telemetry::{MlflowSink, RunRecord, TelemetrySink},
    translator::Translator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
