use super::*;
use crate::bus::InboundEvent;
use crate::cache::MemoryCacheStore;
use crate::normalize::normalize;
use crate::providers::base::ResponseProvider;
use crate::session::InMemorySessionStore;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

struct RecordingDelivery {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingDelivery {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingDelivery {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(
        &self,
        recipient: &str,
        text: &str,
        _options: Option<&serde_json::Value>,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .await
            .push((recipient.to_string(), text.to_string()));
        if self.fail {
            anyhow::bail!("delivery transport down");
        }
        Ok(())
    }
}

struct StubProvider {
    reply: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn respond(
        &self,
        _history: &[ChatMessage],
        _correlation_id: &str,
    ) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("provider unavailable");
        }
        Ok(self.reply.clone())
    }
}

fn chain_of(providers: Vec<Arc<StubProvider>>) -> Arc<FallbackChain> {
    Arc::new(FallbackChain::new(
        providers
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("p{}", i + 1), p as Arc<dyn ResponseProvider>))
            .collect(),
        Duration::from_secs(5),
    ))
}

struct Fixture {
    pipeline: Pipeline,
    sessions: Arc<InMemorySessionStore>,
    delivery: Arc<RecordingDelivery>,
}

fn fixture(providers: Vec<Arc<StubProvider>>, delivery: Arc<RecordingDelivery>) -> Fixture {
    let sessions = Arc::new(InMemorySessionStore::new(10, 64));
    let cache = Arc::new(CacheManager::new(
        Arc::new(MemoryCacheStore::new()),
        true,
        "test".to_string(),
        Duration::from_secs(60),
        100,
    ));
    let pipeline = Pipeline::new(
        sessions.clone(),
        cache,
        chain_of(providers),
        delivery.clone(),
        false,
        DEFAULT_ERROR_NOTICE.to_string(),
    );
    Fixture {
        pipeline,
        sessions,
        delivery,
    }
}

fn webhook_job(sender: &str, text: &str) -> Job {
    let data = json!({
        "key": {"remoteJid": sender, "id": "EXT1"},
        "message": {"conversation": text},
        "messageTimestamp": 1_700_000_000,
    });
    let message = normalize(&data).unwrap();
    Job::new(
        InboundEvent {
            instance: "main".to_string(),
            data,
        },
        message,
    )
}

#[tokio::test]
async fn test_webhook_to_reply_end_to_end() {
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![StubProvider::answering("Bom dia!")], delivery);

    f.pipeline
        .handle_job(webhook_job("5511999999999@s.whatsapp.net", "oi"))
        .await;

    let sent = f.delivery.sent().await;
    assert_eq!(sent, vec![("5511999999999".to_string(), "Bom dia!".to_string())]);

    let turns = f.sessions.history("5511999999999").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "oi");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Bom dia!");
}

#[tokio::test]
async fn test_repeat_message_served_from_cache() {
    let provider = StubProvider::answering("Bom dia!");
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![provider.clone()], delivery);

    f.pipeline
        .handle_job(webhook_job("111@s.whatsapp.net", "oi"))
        .await;
    f.pipeline
        .handle_job(webhook_job("222@s.whatsapp.net", "OI "))
        .await;

    assert_eq!(provider.calls(), 1);
    let sent = f.delivery.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], ("222".to_string(), "Bom dia!".to_string()));

    // A cache hit still lands both turns in the second conversation.
    assert_eq!(f.sessions.history("222").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_first_provider_down_second_answers() {
    let p1 = StubProvider::failing();
    let p2 = StubProvider::answering("fallback reply");
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![p1.clone(), p2], delivery);

    f.pipeline
        .handle_job(webhook_job("111@s.whatsapp.net", "oi"))
        .await;

    assert_eq!(p1.calls(), 1);
    let sent = f.delivery.sent().await;
    assert_eq!(sent, vec![("111".to_string(), "fallback reply".to_string())]);
}

#[tokio::test]
async fn test_exhausted_chain_delivers_nothing() {
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![StubProvider::failing(), StubProvider::failing()], delivery);

    f.pipeline
        .handle_job(webhook_job("111@s.whatsapp.net", "oi"))
        .await;

    assert!(f.delivery.sent().await.is_empty());
    // The user turn still lands; only the reply is missing.
    assert_eq!(f.sessions.history("111").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delivery_failure_triggers_one_compensating_reply() {
    let delivery = RecordingDelivery::failing();
    let f = fixture(vec![StubProvider::answering("Bom dia!")], delivery);

    f.pipeline
        .handle_job(webhook_job("5511999999999@s.whatsapp.net", "oi"))
        .await;

    let sent = f.delivery.sent().await;
    // First the failed reply attempt, then exactly one error notice to the
    // sender salvaged from the raw event.
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, "5511999999999");
    assert_eq!(sent[1].1, DEFAULT_ERROR_NOTICE);
}

#[tokio::test]
async fn test_respond_dispatches_and_caches() {
    let provider = StubProvider::answering("resposta");
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![provider.clone()], delivery);

    let messages = vec![ChatMessage::user("qual o horário?")];
    let reply = f.pipeline.respond(&messages, None).await.unwrap().unwrap();
    assert_eq!(reply.text, "resposta");
    assert_eq!(reply.provider, "p1");

    let reply = f.pipeline.respond(&messages, None).await.unwrap().unwrap();
    assert_eq!(reply.provider, "cache");
    assert_eq!(provider.calls(), 1);

    // Direct chat never goes through delivery.
    assert!(f.delivery.sent().await.is_empty());
}

#[tokio::test]
async fn test_respond_without_user_message_is_malformed() {
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![StubProvider::answering("x")], delivery);

    let messages = vec![ChatMessage::assistant("hello")];
    let err = f.pipeline.respond(&messages, None).await.unwrap_err();
    assert!(matches!(err, PonteError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_respond_exhaustion_is_none() {
    let delivery = RecordingDelivery::new();
    let f = fixture(vec![StubProvider::failing()], delivery);

    let messages = vec![ChatMessage::user("oi")];
    assert!(f.pipeline.respond(&messages, None).await.unwrap().is_none());
}
