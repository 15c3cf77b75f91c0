use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Conversation turn role. Only user and assistant turns flow through the
/// dispatch pipeline; system prompting is a provider-side concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A text-generation backend. Providers are unreliable, orderable
/// alternatives: the caller treats `Ok(None)` (empty output) and `Err` the
/// same way — move on to the next provider.
///
/// `correlation_id` is stable across all turns of one conversation so a
/// provider that keeps server-side state can anchor its own continuity on it.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn respond(
        &self,
        history: &[ChatMessage],
        correlation_id: &str,
    ) -> anyhow::Result<Option<String>>;
}

/// Turn a raw text response into the trait's empty/non-empty contract.
pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_non_empty_filters_whitespace() {
        assert_eq!(non_empty(Some("  \n ".into())), None);
        assert_eq!(non_empty(Some("oi".into())), Some("oi".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_chat_message_constructors() {
        let m = ChatMessage::user("hello");
        assert_eq!(m.role, Role::User);
        let m = ChatMessage::assistant("hi");
        assert_eq!(m.role, Role::Assistant);
    }
}
