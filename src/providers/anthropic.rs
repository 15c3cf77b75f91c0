use crate::providers::base::{non_empty, ChatMessage, ResponseProvider, Role};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::provider_http_client;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: API_URL.to_string(),
            client: provider_http_client(timeout),
        }
    }

    #[cfg(test)]
    fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url,
            client: provider_http_client(Duration::from_secs(5)),
        }
    }

    fn parse_response(json: &Value) -> Option<String> {
        let text = json["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b["type"].as_str() == Some("text"))
            })
            .and_then(|b| b["text"].as_str())
            .map(std::string::ToString::to_string);
        non_empty(text)
    }
}

#[async_trait]
impl ResponseProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
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
            "max_tokens": MAX_TOKENS,
            "messages": messages,
            "metadata": {"user_id": correlation_id},
        });

        let resp = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let json = ProviderErrorHandler::check_response(resp, self.name()).await?;
        Ok(Self::parse_response(&json))
    }
}
