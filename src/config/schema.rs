use crate::errors::PonteError;
use crate::pipeline::DEFAULT_ERROR_NOTICE;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_turns", rename = "maxTurns")]
    pub max_turns: usize,
    #[serde(default = "default_max_sessions", rename = "maxSessions")]
    pub max_sessions: usize,
}

fn default_max_turns() -> usize {
    10
}

fn default_max_sessions() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl", rename = "ttlSecs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries", rename = "maxEntries")]
    pub max_entries: usize,
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    #[serde(default, rename = "scopeByConversation")]
    pub scope_by_conversation: bool,
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    1000
}

fn default_cache_prefix() -> String {
    "ponte".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_secs: default_cache_ttl(),
            max_entries: default_max_entries(),
            prefix: default_cache_prefix(),
            scope_by_conversation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    crate::bus::queue::DEFAULT_WORKERS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAiCompat,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAiCompat => "openai",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Display name in logs and the chain; defaults to the kind.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(default = "default_provider_timeout", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    60
}

impl ProviderConfig {
    pub fn of_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            name: None,
            api_key: String::new(),
            model: None,
            base_url: None,
            timeout_secs: default_provider_timeout(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }
}

// Keys never land in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_delivery_base", rename = "baseUrl")]
    pub base_url: String,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default, rename = "webhookUrl")]
    pub webhook_url: Option<String>,
    #[serde(default = "default_delivery_timeout", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

fn default_delivery_base() -> String {
    "http://localhost:8080".to_string()
}

fn default_instance() -> String {
    "main".to_string()
}

fn default_delivery_timeout() -> u64 {
    crate::channels::evolution::DEFAULT_TIMEOUT_SECS
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: default_delivery_base(),
            api_key: String::new(),
            instance: default_instance(),
            webhook_url: None,
            timeout_secs: default_delivery_timeout(),
        }
    }
}

impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("instance", &self.instance)
            .field("webhook_url", &self.webhook_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_error_notice", rename = "errorNotice")]
    pub error_notice: String,
}

fn default_error_notice() -> String {
    DEFAULT_ERROR_NOTICE.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            error_notice: default_error_notice(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// Fallback order is config order.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::of_kind(ProviderKind::Gemini),
        ProviderConfig::of_kind(ProviderKind::Anthropic),
        ProviderConfig {
            name: Some("deepseek".to_string()),
            ..ProviderConfig::of_kind(ProviderKind::OpenAiCompat)
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            session: SessionConfig::default(),
            cache: CacheConfig::default(),
            queue: QueueConfig::default(),
            providers: default_providers(),
            delivery: DeliveryConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), PonteError> {
        if self.gateway.port == 0 {
            return Err(PonteError::Config("gateway.port must be non-zero".to_string()));
        }
        if self.session.max_turns == 0 {
            return Err(PonteError::Config(
                "session.maxTurns must be at least 1".to_string(),
            ));
        }
        if self.queue.workers == 0 {
            return Err(PonteError::Config(
                "queue.workers must be at least 1".to_string(),
            ));
        }
        if self.providers.is_empty() {
            return Err(PonteError::Config(
                "at least one provider must be configured".to_string(),
            ));
        }
        if self.delivery.base_url.is_empty() {
            return Err(PonteError::Config(
                "delivery.baseUrl must be set".to_string(),
            ));
        }
        for p in &self.providers {
            if p.timeout_secs == 0 {
                return Err(PonteError::Config(format!(
                    "provider '{}' timeoutSecs must be non-zero",
                    p.display_name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
