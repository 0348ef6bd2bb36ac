//! Provider registry: named chat-completion backends

use serde::{Deserialize, Serialize};

/// Built-in providers: (name, base URL, credential variable, models)
const DEFAULT_PROVIDERS: &[(&str, &str, &str, &[&str])] = &[
    (
        "OpenRouter AI",
        "https://openrouter.ai/api/v1",
        "OPENROUTER_API_KEY",
        &["deepseek/deepseek-chat-v3.1:free"],
    ),
    (
        "Groq",
        "https://api.groq.com/openai/v1",
        "GROQ_API_KEY",
        &["llama-3.1-8b-instant"],
    ),
    (
        "Google AI",
        "https://generativelanguage.googleapis.com/v1beta/openai/",
        "GOOGLE_API_KEY",
        &["gemini-2.0-flash-exp"],
    ),
];

/// A configured model backend. The default value is the "empty" config
/// returned for unknown names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub credential_var: String,
    pub models: Vec<String>,
}

impl ProviderConfig {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.base_url.is_empty()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// First listed model
    pub fn default_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    /// Remediation shown when the key is missing
    pub fn credential_hint(&self) -> String {
        format!("Exporta {}.", self.credential_var)
    }
}

/// Immutable, ordered set of providers
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    /// Built-in providers with keys read from the environment
    pub fn from_env() -> Self {
        let providers = DEFAULT_PROVIDERS
            .iter()
            .map(|(name, base_url, credential_var, models)| ProviderConfig {
                name: name.to_string(),
                base_url: base_url.to_string(),
                api_key: std::env::var(credential_var)
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                credential_var: credential_var.to_string(),
                models: models.iter().map(|m| m.to_string()).collect(),
            })
            .collect();

        Self::new(providers)
    }

    pub fn find(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Config for `name`, or an empty config when it is not registered
    pub fn get_provider_config(&self, name: &str) -> ProviderConfig {
        self.find(name).cloned().unwrap_or_default()
    }

    pub fn get_available_models(&self, name: &str) -> Vec<String> {
        self.find(name).map(|p| p.models.clone()).unwrap_or_default()
    }

    pub fn get_all_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }
}
