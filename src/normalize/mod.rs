use crate::errors::PonteError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport suffix Evolution appends to WhatsApp sender JIDs.
const WHATSAPP_SUFFIX: &str = "@s.whatsapp.net";

/// Canonical record every recognized webhook shape normalizes into.
/// `conversation_key` is the only identifier used downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub conversation_key: String,
    pub text: String,
    pub external_id: String,
    pub received_at: DateTime<Utc>,
}

/// The two webhook `data` shapes Evolution sends, matched structurally.
/// Variant order matters: the keyed form is checked first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookData {
    Keyed {
        key: MessageKey,
        message: MessageBody,
        #[serde(rename = "messageTimestamp")]
        message_timestamp: Option<i64>,
    },
    List {
        messages: Vec<ListedMessage>,
    },
}

#[derive(Debug, Deserialize)]
struct MessageKey {
    // Optional so a keyed payload without a sender surfaces as MissingSender
    // rather than an unrecognized shape.
    #[serde(default, rename = "remoteJid")]
    remote_jid: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    conversation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedMessage {
    #[serde(default, rename = "chatId")]
    chat_id: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    id: Option<String>,
}

/// Derive the canonical conversation key from a platform sender JID.
pub fn conversation_key(jid: &str) -> String {
    jid.strip_suffix(WHATSAPP_SUFFIX).unwrap_or(jid).to_string()
}

fn received_at(epoch_secs: Option<i64>) -> DateTime<Utc> {
    epoch_secs
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or_else(Utc::now)
}

/// Parse a webhook `data` object into a `NormalizedMessage`.
///
/// Both recognized shapes carrying an equivalent sender and text produce an
/// identical `conversation_key` and `text`. Unrecognized structure fails
/// `MalformedPayload`; a recognized shape without sender or text fails
/// `MissingSender` / `EmptyText`. No partial record is ever produced.
pub fn normalize(data: &Value) -> Result<NormalizedMessage, PonteError> {
    let parsed: WebhookData = serde_json::from_value(data.clone())
        .map_err(|e| PonteError::MalformedPayload(e.to_string()))?;

    let (sender, text, ts, id) = match parsed {
        WebhookData::Keyed {
            key,
            message,
            message_timestamp,
        } => (
            key.remote_jid.unwrap_or_default(),
            message.conversation.unwrap_or_default(),
            message_timestamp,
            key.id,
        ),
        WebhookData::List { messages } => {
            let first = messages
                .into_iter()
                .next()
                .ok_or_else(|| PonteError::MalformedPayload("empty messages list".to_string()))?;
            (
                first.chat_id.unwrap_or_default(),
                first.body.unwrap_or_default(),
                first.timestamp,
                first.id,
            )
        }
    };

    if sender.is_empty() {
        return Err(PonteError::MissingSender);
    }
    if text.is_empty() {
        return Err(PonteError::EmptyText);
    }

    Ok(NormalizedMessage {
        conversation_key: conversation_key(&sender),
        text,
        external_id: id.unwrap_or_default(),
        received_at: received_at(ts),
    })
}

/// Best-effort sender extraction from a raw payload, for compensating error
/// replies and queue partitioning. Works even when full normalization fails,
/// as long as a sender identifier is present somewhere recognizable.
pub fn salvage_sender(data: &Value) -> Option<String> {
    let jid = data
        .pointer("/key/remoteJid")
        .or_else(|| data.pointer("/messages/0/chatId"))
        .and_then(Value::as_str)?;
    if jid.is_empty() {
        return None;
    }
    Some(conversation_key(jid))
}
