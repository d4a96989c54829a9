//! Error types for the sitesmith generation pipeline.

use thiserror::Error;

/// Failures talking to a model backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider request failed ({status:?}): {message}")]
    RequestFailed {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Short, stable name used when annotating gateway failures.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderError::AuthFailed(_) => "auth_failed",
            ProviderError::RateLimit(_) => "rate_limit",
            ProviderError::ModelNotFound(_) => "model_not_found",
            ProviderError::RequestFailed { .. } => "request_failed",
            ProviderError::Connection(_) => "connection_error",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Provider(_) => "provider_error",
            ProviderError::NotConfigured(_) => "not_configured",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::AuthFailed(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::RequestFailed { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Raw message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::AuthFailed(m)
            | ProviderError::RateLimit(m)
            | ProviderError::ModelNotFound(m)
            | ProviderError::Connection(m)
            | ProviderError::Timeout(m)
            | ProviderError::Provider(m)
            | ProviderError::NotConfigured(m) => m,
            ProviderError::RequestFailed { message, .. } => message,
        }
    }

    /// True for failures where no request reached the backend.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ProviderError::Connection(_))
    }
}

/// Raised by the model gateway once its failure policy is exhausted.
#[derive(Debug, Clone, Error)]
#[error("Model call failed on {model} [{name}]: {message}")]
pub struct GatewayError {
    pub model: String,
    pub name: String,
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
}

impl GatewayError {
    pub fn from_provider(model: &str, err: &ProviderError) -> Self {
        Self {
            model: model.to_string(),
            name: err.name().to_string(),
            message: err.message().to_string(),
            status: err.status(),
            code: err.code().map(str::to_string),
        }
    }
}

/// One builder attempt's failure. Absorbed by the section state machine.
#[derive(Debug, Clone, Error)]
pub enum SectionError {
    #[error("Section output could not be parsed: {0}")]
    Parse(String),

    #[error("Layout validation failed: {}", .0.join(", "))]
    Layout(Vec<String>),

    #[error("Style check failed: {0}")]
    Style(String),

    #[error("Cannot find module '{0}'")]
    Module(String),

    #[error("Component runtime error: {0}")]
    Runtime(String),

    #[error("Model returned an empty or degenerate response")]
    EmptyResponse,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Checkpoint storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Checkpoint store error: {0}")]
    Backend(String),

    #[error("Checkpoint data is corrupt: {0}")]
    Corrupt(String),

    #[error("Checkpoint writer is closed")]
    WriterClosed,

    #[error("Invalid request id: {0:?}")]
    InvalidRequestId(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
