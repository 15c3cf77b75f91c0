pub mod anthropic;
pub mod base;
pub mod errors;
pub mod fallback;
pub mod gemini;
pub mod openai;

use crate::config::schema::{ProviderConfig, ProviderKind};
use crate::errors::PonteError;
use fallback::FallbackChain;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Connect timeout for provider HTTP clients (seconds).
pub(crate) const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build a `reqwest::Client` with the standard connect timeout and the
/// per-provider overall request timeout.
pub(crate) fn provider_http_client(request_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Build the ordered fallback chain from configuration.
///
/// Providers appear in the chain in config order; the order is fixed for the
/// life of the process.
pub fn build_chain(configs: &[ProviderConfig]) -> Result<FallbackChain, PonteError> {
    let mut providers: Vec<(String, Arc<dyn base::ResponseProvider>)> = Vec::new();
    let mut max_timeout = Duration::from_secs(0);

    for cfg in configs {
        if cfg.api_key.is_empty() {
            tracing::warn!("provider '{}' has no API key, skipping", cfg.display_name());
            continue;
        }
        let timeout = Duration::from_secs(cfg.timeout_secs);
        max_timeout = max_timeout.max(timeout);
        let provider: Arc<dyn base::ResponseProvider> = match cfg.kind {
            ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
                cfg.api_key.clone(),
                cfg.model.clone(),
                timeout,
            )),
            ProviderKind::Anthropic => Arc::new(anthropic::AnthropicProvider::new(
                cfg.api_key.clone(),
                cfg.model.clone(),
                timeout,
            )),
            ProviderKind::OpenAiCompat => Arc::new(openai::OpenAiCompatProvider::new(
                cfg.display_name().to_string(),
                cfg.api_key.clone(),
                cfg.model.clone(),
                cfg.base_url.clone(),
                timeout,
            )),
        };
        providers.push((cfg.display_name().to_string(), provider));
    }

    if providers.is_empty() {
        return Err(PonteError::Config(
            "no usable response providers configured".to_string(),
        ));
    }

    // The chain timeout bounds a single provider attempt; give the slowest
    // configured provider a small margin over its own HTTP timeout.
    Ok(FallbackChain::new(
        providers,
        max_timeout + Duration::from_secs(5),
    ))
}
