use crate::providers::base::{non_empty, ChatMessage, ResponseProvider, Role};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::provider_http_client;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: API_BASE.to_string(),
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
        let text = json["candidates"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .and_then(|parts| parts.first())
            .and_then(|p| p["text"].as_str())
            .map(std::string::ToString::to_string);
        non_empty(text)
    }
}

#[async_trait]
impl ResponseProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn respond(
        &self,
        history: &[ChatMessage],
        _correlation_id: &str,
    ) -> Result<Option<String>> {
        // Gemini has no request-level session anchor; continuity relies on the
        // correlation prefix the fallback chain already folded into content.
        let contents: Vec<Value> = history
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    },
                    "parts": [{"text": m.content}],
                })
            })
            .collect();

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&json!({"contents": contents}))
            .send()
            .await?;

        let json = ProviderErrorHandler::check_response(resp, self.name()).await?;
        Ok(Self::parse_response(&json))
    }
}
