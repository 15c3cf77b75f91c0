use crate::providers::base::{ChatMessage, Role};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Bounded per-conversation message history, keyed by conversation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: String) -> Self {
        let now = Utc::now();
        Self {
            key,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, truncating from the front once over `max_turns`.
    pub fn push(&mut self, role: Role, content: String, max_turns: usize) {
        self.turns.push(Turn {
            role,
            content,
            at: Utc::now(),
        });
        self.updated_at = Utc::now();

        if self.turns.len() > max_turns {
            let drain_count = self.turns.len() - max_turns;
            self.turns.drain(..drain_count);
        }
    }

    pub fn as_history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|t| ChatMessage {
                role: t.role,
                content: t.content.clone(),
            })
            .collect()
    }
}

/// Session storage backend. The in-memory implementation is the single-process
/// default; the trait is the seam for an externally shared backend when
/// running more than one worker process.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a turn to the conversation, creating the session if unseen.
    async fn append(&self, key: &str, role: Role, content: &str) -> Result<()>;

    /// Full turn history for a conversation (empty if unseen).
    async fn history(&self, key: &str) -> Result<Vec<Turn>>;

    /// Delete a session. Returns whether it existed.
    async fn clear(&self, key: &str) -> Result<bool>;

    /// Snapshot of all tracked sessions (operator surface).
    async fn all(&self) -> Result<Vec<Session>>;
}
