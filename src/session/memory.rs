use crate::providers::base::Role;
use crate::session::store::{Session, SessionStore, Turn};
use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

const DEFAULT_MAX_SESSIONS: usize = 1024;

/// In-process session store. One lock guards the session map, so appends to
/// the same key are serialized; the map itself is LRU-bounded so idle
/// conversations fall away instead of growing without limit.
pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, Session>>,
    max_turns: usize,
}

impl InMemorySessionStore {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        let cap = NonZeroUsize::new(max_sessions)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_MAX_SESSIONS).expect("nonzero"));
        Self {
            sessions: Mutex::new(LruCache::new(cap)),
            max_turns: max_turns.max(1),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, key: &str, role: Role, content: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        let session = match sessions.get_mut(key) {
            Some(s) => s,
            None => {
                sessions.put(key.to_string(), Session::new(key.to_string()));
                sessions.get_mut(key).expect("just inserted")
            }
        };
        session.push(role, content.to_string(), self.max_turns);
        Ok(())
    }

    async fn history(&self, key: &str) -> Result<Vec<Turn>> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .get(key)
            .map(|s| s.turns.clone())
            .unwrap_or_default())
    }

    async fn clear(&self, key: &str) -> Result<bool> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.pop(key).is_some())
    }

    async fn all(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.iter().map(|(_, s)| s.clone()).collect())
    }
}
