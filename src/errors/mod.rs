use thiserror::Error;

/// Typed error hierarchy for ponte.
///
/// Use at module boundaries (webhook normalization, provider calls, delivery,
/// config validation). Internal/leaf functions can continue using
/// `anyhow::Result` — the `Internal` variant allows seamless conversion via
/// the `?` operator.
#[derive(Debug, Error)]
pub enum PonteError {
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("No sender identifier in payload")]
    MissingSender,

    #[error("No message text in payload")]
    EmptyText,

    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("No provider produced a response")]
    AllProvidersExhausted,

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PonteError {
    /// Whether the inbound event should be dropped silently (recognized shape,
    /// nothing actionable) as opposed to logged as a malformed payload.
    pub fn is_silent_drop(&self) -> bool {
        matches!(self, Self::MissingSender | Self::EmptyText)
    }
}
