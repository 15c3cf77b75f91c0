use crate::channels::base::DeliveryChannel;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for an Evolution API gateway, the bridge between this service
/// and WhatsApp. One client serves one configured instance for outbound
/// delivery; webhook registration can target any instance by name.
pub struct EvolutionClient {
    base_url: String,
    api_key: String,
    instance: String,
    client: reqwest::Client,
}

impl EvolutionClient {
    pub fn new(base_url: &str, api_key: &str, instance: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            instance: instance.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value> {
        debug!("Evolution API request to {}", url);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Evolution API request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Evolution API returned {}: {}", status, body);
            anyhow::bail!("Evolution API returned {}: {}", status, body);
        }

        // Delivery endpoints answer 2xx with an empty body on some versions.
        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).context("Evolution API returned non-JSON body")
    }

    /// Deliver a media message (image, document, audio) to `recipient`.
    /// `media` is a URL or base64 payload, passed through as Evolution
    /// expects it.
    pub async fn send_media(
        &self,
        recipient: &str,
        media: &str,
        file_name: Option<&str>,
        caption: Option<&str>,
        options: Option<&Value>,
    ) -> Result<Value> {
        let mut payload = json!({
            "number": recipient,
            "media": media,
        });
        if let Some(map) = payload.as_object_mut() {
            if let Some(file_name) = file_name {
                map.insert("fileName".to_string(), json!(file_name));
            }
            if let Some(caption) = caption {
                map.insert("caption".to_string(), json!(caption));
            }
            if let Some(options) = options {
                map.insert("options".to_string(), options.clone());
            }
        }

        let url = format!("{}/message/sendMedia/{}", self.base_url, self.instance);
        self.post_json(&url, &payload).await
    }

    /// Register `webhook_url` as the message webhook for `instance`.
    pub async fn set_webhook(&self, instance: &str, webhook_url: &str) -> Result<Value> {
        let payload = json!({
            "webhook": webhook_url,
            "enabled": true,
            "webhook_by_events": false,
        });
        let url = format!("{}/instance/setWebhook/{}", self.base_url, instance);
        self.post_json(&url, &payload).await
    }
}

#[async_trait]
impl DeliveryChannel for EvolutionClient {
    fn name(&self) -> &str {
        "evolution"
    }

    async fn send(&self, recipient: &str, text: &str, options: Option<&Value>) -> Result<()> {
        let mut payload = json!({
            "number": recipient,
            "text": text,
        });
        if let (Some(map), Some(options)) = (payload.as_object_mut(), options) {
            map.insert("options".to_string(), options.clone());
        }

        let url = format!("{}/message/sendText/{}", self.base_url, self.instance);
        self.post_json(&url, &payload).await?;
        debug!("delivered {} chars to {}", text.len(), recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
