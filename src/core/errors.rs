//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// No usable API key for the active provider
    #[error("No se encontró API key para {provider}. {hint}")]
    MissingCredential {
        provider: String,
        hint: String,
    },

    /// The model endpoint could not be reached
    #[error("Servicio no disponible: {message}")]
    ServiceUnavailable {
        message: String,
    },

    /// API request failed
    #[error("Error de la API: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Invalid response from API
    #[error("Respuesta inválida: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Request timeout
    #[error("Tiempo de espera agotado")]
    TimeoutError,

    /// Malformed request body
    #[error("Solicitud inválida: {message}")]
    InvalidRequest {
        message: String,
    },

    /// Prompt lookup on an unregistered task
    #[error("Tarea '{task}' no encontrada")]
    UnknownTask {
        task: String,
    },

    /// Provider lookup on an unregistered name
    #[error("Proveedor '{name}' no configurado")]
    UnknownProvider {
        name: String,
    },

    /// Tracking backend failure
    #[error("Error de telemetría: {message}")]
    TelemetryError {
        message: String,
    },

    /// Configuration error
    #[error("Error de configuración: {message}")]
    ConfigError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl TranslationError {
    /// Whether the error should be shown with a credential remediation hint
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, TranslationError::MissingCredential { .. })
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
