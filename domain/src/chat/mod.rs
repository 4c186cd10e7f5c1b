//! Chat domain.
//!
//! - [`entities::ChatMessage`]: one message sent to a model backend
//! - [`entities::Role`]: author of a chat message

pub mod entities;
