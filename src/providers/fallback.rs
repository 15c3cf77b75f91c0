use crate::providers::base::{ChatMessage, ResponseProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// A reply produced by the chain, tagged with the provider that answered.
#[derive(Debug, Clone)]
pub struct DispatchReply {
    pub text: String,
    pub provider: String,
}

/// An ordered chain of named response providers of decreasing preference.
///
/// `dispatch` tries each provider in turn and returns the first non-empty
/// reply. A provider that errors, times out, or returns empty text is skipped;
/// once one answers, later providers are never invoked. Exhausting the chain
/// yields `None` — "no answer available", not a hard error. The list is fixed
/// for the life of the process.
pub struct FallbackChain {
    providers: Vec<(String, Arc<dyn ResponseProvider>)>,
    attempt_timeout: Duration,
}

impl FallbackChain {
    pub fn new(
        providers: Vec<(String, Arc<dyn ResponseProvider>)>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Prefix each turn with the conversation's correlation token so a
    /// provider keeping server-side thread state anchors it on the same key
    /// the caller uses.
    fn annotate(history: &[ChatMessage], conversation_key: &str) -> Vec<ChatMessage> {
        history
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: format!("<conv:{}>\n\n{}", conversation_key, m.content),
            })
            .collect()
    }

    pub async fn dispatch(
        &self,
        history: &[ChatMessage],
        conversation_key: &str,
    ) -> Option<DispatchReply> {
        let annotated = Self::annotate(history, conversation_key);

        for (name, provider) in &self.providers {
            match timeout(
                self.attempt_timeout,
                provider.respond(&annotated, conversation_key),
            )
            .await
            {
                Ok(Ok(Some(text))) if !text.trim().is_empty() => {
                    debug!("provider '{}' answered for {}", name, conversation_key);
                    return Some(DispatchReply {
                        text,
                        provider: name.clone(),
                    });
                }
                Ok(Ok(_)) => {
                    warn!(
                        "provider '{}' returned empty for {}, trying next",
                        name, conversation_key
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        "provider '{}' failed for {}: {}, trying next",
                        name, conversation_key, e
                    );
                }
                Err(_) => {
                    warn!(
                        "provider '{}' timed out after {:?} for {}, trying next",
                        name, self.attempt_timeout, conversation_key
                    );
                }
            }
        }

        warn!("all providers exhausted for {}", conversation_key);
        None
    }
}
