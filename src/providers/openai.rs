use crate::providers::base::{non_empty, ChatMessage, ResponseProvider, Role};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::provider_http_client;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "deepseek-chat";
const MAX_TOKENS: u32 = 1024;

/// Chat-completions client for OpenAI-compatible APIs. The default
/// configuration points at DeepSeek, the original deployment's last-resort
/// backend; any compatible endpoint works via `base_url`.
pub struct OpenAiCompatProvider {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: String,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEEPSEEK_API_URL.to_string()),
            client: provider_http_client(timeout),
        }
    }

    fn parse_response(json: &Value) -> Option<String> {
        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(std::string::ToString::to_string);
        non_empty(content)
    }
}

#[async_trait]
impl ResponseProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        history: &[ChatMessage],
        correlation_id: &str,
    ) -> Result<Option<String>> {
        let messages: Vec<Value> = history
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": MAX_TOKENS,
            "user": correlation_id,
        });

        let resp = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let json = ProviderErrorHandler::check_response(resp, &self.name).await?;
        Ok(Self::parse_response(&json))
    }
}
