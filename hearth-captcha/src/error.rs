//! Error types for challenge solving.

use thiserror::Error;

/// Result type for captcha operations.
pub type CaptchaResult<T> = Result<T, CaptchaError>;

/// Errors that can occur while selecting a backend or solving a challenge.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// No backend is registered under this name.
    #[error("unknown captcha backend: {0}")]
    UnknownBackend(String),

    /// Credential material is absent or malformed.
    #[error("missing credential for {service}: {reason}")]
    MissingCredential { service: String, reason: String },

    /// The backend exists but cannot be used in this build or environment.
    #[error("captcha backend {service} unavailable: {reason}")]
    DependencyUnavailable { service: String, reason: String },

    /// Network error talking to the backend.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error.
    #[error("{service} error: {message}")]
    Backend { service: String, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CaptchaError {
    pub(crate) fn missing_credential(service: &str, reason: impl Into<String>) -> Self {
        Self::MissingCredential {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn backend(service: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            service: service.to_string(),
            message: message.into(),
        }
    }
}
