//! Conversation domain entities

use crate::chat::entities::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title given to a conversation until it is renamed
pub const DEFAULT_TITLE: &str = "New Conversation";

/// A message stored in a conversation
///
/// User turns carry text. Assistant turns carry the three council stages as
/// opaque JSON payloads; a stage is `None` when nothing was stored for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        stage1: Option<Value>,
        stage2: Option<Value>,
        stage3: Option<Value>,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(stage1: Value, stage2: Value, stage3: Value) -> Self {
        Message::Assistant {
            stage1: Some(stage1),
            stage2: Some(stage2),
            stage3: Some(stage3),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
        }
    }
}

/// A persisted conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// A conversation shell with the default title and no messages
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// Returns `true` while the title has never been changed
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Number of user turns so far
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role() == Role::User)
            .count()
    }
}

/// Conversation metadata for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_conversation_defaults() {
        let conv = Conversation::new("c1", Utc::now());
        assert_eq!(conv.title, DEFAULT_TITLE);
        assert!(conv.has_default_title());
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_message_serialization_is_role_tagged() {
        let user = Message::user("hello");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"role": "user", "content": "hello"})
        );

        let assistant = Message::assistant(json!([1]), json!([]), json!({"x": 1}));
        let value = serde_json::to_value(&assistant).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["stage3"]["x"], 1);
    }

    #[test]
    fn test_user_turns() {
        let mut conv = Conversation::new("c1", Utc::now());
        conv.messages.push(Message::user("q1"));
        conv.messages
            .push(Message::assistant(json!(null), json!(null), json!(null)));
        conv.messages.push(Message::user("q2"));
        assert_eq!(conv.user_turns(), 2);
    }
}
