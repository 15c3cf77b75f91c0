use crate::errors::PonteError;
use serde_json::Value;
use tracing::warn;

/// Common error handling for provider HTTP responses.
///
/// All providers funnel their responses through `check_response` so that
/// status handling and error extraction stay consistent across backends.
pub struct ProviderErrorHandler;

impl ProviderErrorHandler {
    /// Parse an API error body into a typed error. 5xx and 429 are marked
    /// retryable for callers that retry; the fallback chain itself does not
    /// retry a provider, it moves on to the next one.
    pub fn parse_api_error(status: u16, error_text: &str) -> PonteError {
        let retryable = matches!(status, 429 | 500 | 502 | 503);

        if let Ok(error_json) = serde_json::from_str::<Value>(error_text)
            && let Some(err) = error_json.get("error")
        {
            let error_type = err
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let error_msg = err
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");
            return PonteError::Provider {
                message: format!("API error ({}): {}", error_type, error_msg),
                retryable,
            };
        }

        PonteError::Provider {
            message: format!("API error ({}): {}", status, error_text),
            retryable,
        }
    }

    /// Check an HTTP response for errors and return the body as JSON.
    pub async fn check_response(
        resp: reqwest::Response,
        provider: &str,
    ) -> anyhow::Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("{} returned HTTP {}: {}", provider, status, error_text);
            return Err(Self::parse_api_error(status.as_u16(), &error_text).into());
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse {} API response: {}", provider, e))?;

        // Some backends report errors with a 200 status and an error body.
        if let Some(error_val) = json.get("error") {
            let error_text =
                serde_json::to_string(error_val).unwrap_or_else(|_| "Unknown error".to_string());
            warn!("{} returned error body: {}", provider, error_text);
            return Err(Self::parse_api_error(status.as_u16(), &error_text).into());
        }

        Ok(json)
    }
}
