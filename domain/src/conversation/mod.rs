//! Conversation domain.
//!
//! - [`entities::Conversation`]: a persisted conversation with ordered messages
//! - [`entities::Message`]: a user turn or a three-stage assistant turn
//! - [`entities::ConversationSummary`]: listing metadata

pub mod entities;
