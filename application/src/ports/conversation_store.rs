//! Conversation store port
//!
//! Durable storage of conversations and their ordered messages.

use async_trait::async_trait;
use council_domain::{Conversation, ConversationSummary};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a conversation store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Storage task failed: {0}")]
    TaskJoin(String),
}

/// Persistence of conversations
///
/// Messages are append-only and read back in insertion order. Only the
/// conversation title may change after creation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create the schema if it does not exist yet. Safe to call repeatedly.
    async fn init(&self) -> Result<(), StoreError>;

    /// Create a conversation, or return the existing one unchanged.
    ///
    /// The returned value always has an empty message list.
    async fn create_conversation(&self, id: &str) -> Result<Conversation, StoreError>;

    /// Load a conversation with all of its messages, `None` if unknown
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StoreError>;

    /// All conversations, newest first
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Append a user message
    async fn add_user_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<(), StoreError>;

    /// Append an assistant message holding the three stage payloads
    async fn add_assistant_message(
        &self,
        conversation_id: &str,
        stage1: &Value,
        stage2: &Value,
        stage3: &Value,
    ) -> Result<(), StoreError>;

    /// Rename a conversation; `NotFound` if it does not exist
    async fn update_conversation_title(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StoreError>;
}
