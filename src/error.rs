//! Mimir error types

use std::time::Duration;

use crate::types::ProviderId;

/// Mimir error types
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Configuration errors (fatal at startup)
    #[error("configuration error: {0}")]
    Configuration(String),

    // Caller errors
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The id is known but no adapter was built for it (credential absent
    /// at startup).
    #[error("provider not configured: {0}")]
    ProviderNotConfigured(ProviderId),

    // Provider/network errors
    #[error("upstream error from {provider}: {cause}")]
    Upstream {
        provider: ProviderId,
        cause: UpstreamCause,
    },

    // Data-quality errors
    /// The provider answered, but no extraction strategy found anything usable.
    #[error("no structured content in model response")]
    NoStructuredContent,

    #[error("cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a provider call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamCause {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl MimirError {
    /// Build an upstream error for `provider`.
    pub fn upstream(provider: ProviderId, cause: UpstreamCause) -> Self {
        MimirError::Upstream { provider, cause }
    }

    /// Whether resubmitting the same request may succeed.
    ///
    /// Mimir never retries on its own; this is for the calling layer.
    pub fn is_transient(&self) -> bool {
        match self {
            MimirError::Upstream { cause, .. } => match cause {
                UpstreamCause::Http(_) | UpstreamCause::Timeout => true,
                UpstreamCause::RateLimited { .. } => true,
                UpstreamCause::Api { status, .. } => *status >= 500,
                UpstreamCause::AuthenticationFailed | UpstreamCause::MalformedResponse(_) => false,
            },
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MimirError::Upstream {
                cause: UpstreamCause::RateLimited { retry_after },
                ..
            } => *retry_after,
            _ => None,
        }
    }

    /// The provider involved, for upstream failures.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            MimirError::Upstream { provider, .. } => Some(*provider),
            MimirError::ProviderNotConfigured(provider) => Some(*provider),
            _ => None,
        }
    }
}

impl UpstreamCause {
    /// Classify a reqwest transport error.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamCause::Timeout
        } else if err.is_decode() {
            UpstreamCause::MalformedResponse(err.to_string())
        } else {
            UpstreamCause::Http(err.to_string())
        }
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
