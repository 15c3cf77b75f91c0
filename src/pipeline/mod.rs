use crate::bus::Job;
use crate::cache::CacheManager;
use crate::channels::DeliveryChannel;
use crate::errors::PonteError;
use crate::normalize::salvage_sender;
use crate::providers::base::{ChatMessage, Role};
use crate::providers::fallback::{DispatchReply, FallbackChain};
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const DEFAULT_ERROR_NOTICE: &str =
    "Desculpe, ocorreu um erro ao processar sua mensagem. Tente novamente em instantes.";

/// The dispatch controller: one instance drives every job the queue workers
/// dequeue, plus the synchronous direct-chat path.
///
/// Failures inside a job never escape `handle_job`; each failed job gets
/// exactly one compensating error notice toward whoever sent the message.
pub struct Pipeline {
    sessions: Arc<dyn SessionStore>,
    cache: Arc<CacheManager>,
    chain: Arc<FallbackChain>,
    delivery: Arc<dyn DeliveryChannel>,
    scope_cache_by_conversation: bool,
    error_notice: String,
}

impl Pipeline {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        cache: Arc<CacheManager>,
        chain: Arc<FallbackChain>,
        delivery: Arc<dyn DeliveryChannel>,
        scope_cache_by_conversation: bool,
        error_notice: String,
    ) -> Self {
        Self {
            sessions,
            cache,
            chain,
            delivery,
            scope_cache_by_conversation,
            error_notice,
        }
    }

    fn scope<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.scope_cache_by_conversation.then_some(key)
    }

    /// Entry point for queue workers. Never returns an error and never
    /// panics a worker; a failed job ends in compensation instead.
    pub async fn handle_job(&self, job: Job) {
        let key = job.message.conversation_key.clone();
        if let Err(e) = self.process(&job).await {
            error!("processing failed for {}: {}", key, e);
            self.compensate(&job).await;
        }
    }

    async fn process(&self, job: &Job) -> Result<(), PonteError> {
        let msg = &job.message;
        let key = &msg.conversation_key;

        self.sessions.append(key, Role::User, &msg.text).await?;

        if let Some(hit) = self.cache.get(&msg.text, self.scope(key)).await {
            debug!("cache hit for {}, skipping dispatch", key);
            self.sessions
                .append(key, Role::Assistant, &hit.response)
                .await?;
            return self.deliver(key, &hit.response).await;
        }

        let history: Vec<ChatMessage> = self
            .sessions
            .history(key)
            .await?
            .iter()
            .map(|t| ChatMessage {
                role: t.role,
                content: t.content.clone(),
            })
            .collect();

        match self.chain.dispatch(&history, key).await {
            Some(reply) => {
                self.cache.put(&msg.text, &reply.text, self.scope(key)).await;
                self.sessions
                    .append(key, Role::Assistant, &reply.text)
                    .await?;
                self.deliver(key, &reply.text).await
            }
            None => {
                // No answer is not a failure: stay quiet rather than
                // following up with an error notice.
                warn!("no provider answered for {}, suppressing delivery", key);
                Ok(())
            }
        }
    }

    async fn deliver(&self, recipient: &str, text: &str) -> Result<(), PonteError> {
        self.delivery
            .send(recipient, text, None)
            .await
            .map_err(|e| PonteError::Delivery(e.to_string()))
    }

    /// Best-effort error notice to the original sender. The sender is
    /// re-extracted from the raw event so compensation works even when the
    /// failure corrupted later pipeline state.
    async fn compensate(&self, job: &Job) {
        let recipient = salvage_sender(&job.event.data)
            .unwrap_or_else(|| job.message.conversation_key.clone());
        if let Err(e) = self
            .delivery
            .send(&recipient, &self.error_notice, None)
            .await
        {
            error!("compensating reply to {} failed: {}", recipient, e);
        }
    }

    /// Synchronous cache→dispatch path behind the direct chat endpoint. The
    /// queue and session store are bypassed; the caller owns the history.
    pub async fn respond(
        &self,
        messages: &[ChatMessage],
        session_id: Option<&str>,
    ) -> Result<Option<DispatchReply>, PonteError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .ok_or_else(|| {
                PonteError::MalformedPayload("no user message in request".to_string())
            })?
            .content
            .clone();
        let key = session_id.unwrap_or("api");

        if let Some(hit) = self.cache.get(&prompt, self.scope(key)).await {
            return Ok(Some(DispatchReply {
                text: hit.response,
                provider: "cache".to_string(),
            }));
        }

        match self.chain.dispatch(messages, key).await {
            Some(reply) => {
                self.cache.put(&prompt, &reply.text, self.scope(key)).await;
                Ok(Some(reply))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests;
