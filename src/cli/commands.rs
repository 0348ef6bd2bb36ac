//! CLI command definitions and handlers

use clap::Subcommand;
use tracing::info;

use crate::core::config::TranslatorConfig;
use crate::core::models::{TranslationRequest, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
use crate::core::prompts::PromptRegistry;
use crate::core::providers::ProviderRegistry;
use crate::core::translator::{error_message, Translator};

/// Default bind address of the web UI
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port of the web UI
pub const DEFAULT_PORT: u16 = 7860;

/// Commands for the translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web UI and HTTP API
    Server {
        /// Bind address
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Listen port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Registry provider to use instead of OpenAI
        #[arg(long)]
        provider: Option<String>,
    },

    /// Translate a text once and print the result
    Translate {
        /// Text to translate
        text: String,

        /// Source language
        #[arg(short, long, default_value = DEFAULT_SOURCE_LANG)]
        source_lang: String,

        /// Target language
        #[arg(short, long, default_value = DEFAULT_TARGET_LANG)]
        target_lang: String,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,

        /// Registry provider to use instead of OpenAI
        #[arg(long)]
        provider: Option<String>,
    },

    /// Run a prompt task (e.g. "Resumen") on a text
    Task {
        /// Task name
        task: String,

        /// Input text
        text: String,

        /// Source language (translation task only)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Target language (translation task only)
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,

        /// Registry provider to use instead of OpenAI
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the conversation a task would send, as JSON
    Prompt {
        /// Task name
        task: String,

        /// Input text
        text: String,

        /// Source language (translation task only)
        #[arg(short, long)]
        source_lang: Option<String>,

        /// Target language (translation task only)
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// List configured providers and their models
    Providers,

    /// List prompt tasks
    Tasks,
}

/// Handle server command
pub async fn handle_server(
    host: String,
    port: u16,
    provider: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    crate::server::api::run_server(host, port, provider, api_key).await
}

async fn build_translator(
    provider: Option<&str>,
    api_key: Option<String>,
) -> anyhow::Result<Translator> {
    let config = TranslatorConfig::from_env_with_key(api_key)?;
    let providers = ProviderRegistry::from_env();
    Ok(Translator::resolve(&config, &providers, provider).await?)
}

/// Handle one-shot translation command
pub async fn handle_translate(
    text: String,
    source_lang: String,
    target_lang: String,
    model: Option<String>,
    provider: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let translator = build_translator(provider.as_deref(), api_key).await?;

    let mut request = TranslationRequest::new(text)
        .with_source_lang(source_lang)
        .with_target_lang(target_lang);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    info!(
        "Translating {} → {}",
        request.source_lang, request.target_lang
    );
    println!("{}", translator.respond(&request).await);

    Ok(())
}

/// Handle prompt task command
pub async fn handle_task(
    task: String,
    text: String,
    source_lang: Option<String>,
    target_lang: Option<String>,
    model: Option<String>,
    provider: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let translator = build_translator(provider.as_deref(), api_key).await?;

    let result = translator
        .run_task(
            &task,
            &text,
            source_lang.as_deref(),
            target_lang.as_deref(),
            model.as_deref(),
        )
        .await;

    match result {
        Ok(outcome) => println!("{}", outcome.render()),
        Err(e) => println!("{}", error_message(&e)),
    }

    Ok(())
}

/// Handle prompt preview command
pub fn handle_prompt(
    task: String,
    text: String,
    source_lang: Option<String>,
    target_lang: Option<String>,
) -> anyhow::Result<()> {
    let conversation = PromptRegistry::default().format_prompt(
        &task,
        &text,
        source_lang.as_deref(),
        target_lang.as_deref(),
    )?;

    println!("{}", serde_json::to_string_pretty(&conversation)?);
    Ok(())
}

/// Handle providers listing command
pub fn handle_providers() {
    let registry = ProviderRegistry::from_env();

    for name in registry.get_all_providers() {
        let provider = registry.get_provider_config(&name);
        let key = if provider.has_credential() {
            "✅"
        } else {
            "❌"
        };
        println!("{} {} ({})", key, provider.name, provider.base_url);
        for model in registry.get_available_models(&name) {
            println!("   - {}", model);
        }
    }
}

/// Handle tasks listing command
pub fn handle_tasks() {
    for task in PromptRegistry::default().get_all_tasks() {
        println!("{}", task);
    }
}
