//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory where Docker Swarm mounts secrets
pub const SECRETS_DIR: &str = "/run/secrets";

/// Secret file names checked before the environment, in order
const SECRET_NAMES: &[&str] = &["OPENAI_API_KEY", "openai_api_key", "api_key"];

/// Environment variables holding the OpenAI key, in order
const CREDENTIAL_VARS: &[&str] = &["OPENAI_API_KEY", "API_KEY"];

/// Tracking URI used when `ENABLE_MLFLOW=1` and no URI is given
pub const DEFAULT_TRACKING_URI: &str = "http://mlflow-server:5000";

/// A place an API key may be read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A key given on the command line
    Explicit(String),
    /// A mounted secret file; surrounding whitespace is trimmed
    SecretFile(PathBuf),
    /// An environment variable
    EnvVar(String),
}

impl CredentialSource {
    /// Read the source, treating unreadable or empty values as absent
    pub fn read(&self) -> Option<String> {
        let value = match self {
            CredentialSource::Explicit(value) => value.clone(),
            CredentialSource::SecretFile(path) => match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    if path.exists() {
                        warn!("Failed to read secret {}: {}", path.display(), e);
                    }
                    return None;
                }
            },
            CredentialSource::EnvVar(name) => std::env::var(name).ok()?,
        };

        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Secret files under `secrets_dir` followed by the environment variables
    pub fn default_chain_in(secrets_dir: impl AsRef<Path>) -> Vec<CredentialSource> {
        let secrets_dir = secrets_dir.as_ref();
        SECRET_NAMES
            .iter()
            .map(|name| CredentialSource::SecretFile(secrets_dir.join(name)))
            .chain(
                CREDENTIAL_VARS
                    .iter()
                    .map(|name| CredentialSource::EnvVar(name.to_string())),
            )
            .collect()
    }

    /// The chain used in production
    pub fn default_chain() -> Vec<CredentialSource> {
        Self::default_chain_in(SECRETS_DIR)
    }

    /// `explicit`, when given, ahead of the sources under `secrets_dir`
    pub fn chain_with_in(
        explicit: Option<String>,
        secrets_dir: impl AsRef<Path>,
    ) -> Vec<CredentialSource> {
        explicit
            .map(CredentialSource::Explicit)
            .into_iter()
            .chain(Self::default_chain_in(secrets_dir))
            .collect()
    }

    pub fn chain_with(explicit: Option<String>) -> Vec<CredentialSource> {
        Self::chain_with_in(explicit, SECRETS_DIR)
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Explicit(_) => write!(f, "command line"),
            CredentialSource::SecretFile(path) => write!(f, "secret file {}", path.display()),
            CredentialSource::EnvVar(name) => write!(f, "env {}", name),
        }
    }
}

/// First non-empty value in `sources`
pub fn resolve_credential(sources: &[CredentialSource]) -> Option<String> {
    sources.iter().find_map(|source| {
        let value = source.read();
        if value.is_some() {
            debug!("API key found in {}", source);
        }
        value
    })
}

/// Experiment tracking settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub uri: Option<String>,
    pub experiment_id: String,
}

impl TrackingConfig {
    /// Build from raw values of `MLFLOW_TRACKING_URI`, `ENABLE_MLFLOW` and
    /// `MLFLOW_EXPERIMENT_ID`
    pub fn from_values(
        uri: Option<String>,
        enable_flag: Option<String>,
        experiment_id: Option<String>,
    ) -> Self {
        let uri = uri.filter(|u| !u.trim().is_empty()).or_else(|| {
            (enable_flag.as_deref() == Some("1")).then(|| DEFAULT_TRACKING_URI.to_string())
        });

        Self {
            uri,
            experiment_id: experiment_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| "0".to_string()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("MLFLOW_TRACKING_URI").ok(),
            std::env::var("ENABLE_MLFLOW").ok(),
            std::env::var("MLFLOW_EXPERIMENT_ID").ok(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.uri.is_some()
    }
}

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Never serialized back out
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub api_endpoint: String,
    pub default_model: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            timeout_ms: 30000,
            tracking: TrackingConfig::from_values(None, None, None),
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from environment variables and mounted secrets
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with_key(None)
    }

    /// Like [`TranslatorConfig::from_env`], with `api_key` taking precedence
    /// over secrets and environment
    pub fn from_env_with_key(api_key: Option<String>) -> anyhow::Result<Self> {
        Self::from_env_with(&CredentialSource::chain_with(api_key))
    }

    /// Load configuration resolving the key from `sources`
    pub fn from_env_with(sources: &[CredentialSource]) -> anyhow::Result<Self> {
        let api_key = resolve_credential(sources);

        let api_endpoint = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let default_model = std::env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse::<u64>()?;

        let config = Self {
            api_key,
            api_endpoint,
            default_model,
            timeout_ms,
            tracking: TrackingConfig::from_env(),
        };

        info!("OpenAI API key present: {}", config.has_api_key());
        info!(
            "Tracking enabled={} uri={}",
            config.tracking.is_enabled(),
            config.tracking.uri.as_deref().unwrap_or("-")
        );

        Ok(config)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_endpoint.trim().is_empty() {
            return Err(anyhow::anyhow!("API endpoint is required"));
        }

        if self.default_model.trim().is_empty() {
            return Err(anyhow::anyhow!("Default model is required"));
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!("timeout_ms must be greater than 0"));
        }

        if !self.has_api_key() {
            warn!("No API key configured; translations will report a missing credential");
        }

        Ok(())
    }
}
