//! Domain layer for llm-council
//!
//! This crate contains the core entities and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is a fixed list of backend models. One user turn is broadcast
//! to every member in parallel; the answers are ranked by the members and a
//! chairman model writes the final synthesis.
//!
//! ## Conversation
//!
//! A conversation is an append-only, ordered log of user turns and
//! three-stage assistant turns.

pub mod chat;
pub mod config;
pub mod conversation;
pub mod core;
pub mod council;
pub mod prompt;

// Re-export commonly used types
pub use chat::entities::{ChatMessage, Role};
pub use config::OutputFormat;
pub use conversation::entities::{Conversation, ConversationSummary, DEFAULT_TITLE, Message};
pub use core::{error::DomainError, model::Model, question::Question};
pub use council::{
    ranking::{aggregate_rankings, parse_ranking, response_label},
    stages::{AggregateRank, PeerRanking, RankingFailure, RankingOutcome, Stage, Synthesis},
    value_objects::{BackendResult, CouncilEntry, CouncilResponseSet},
};
pub use prompt::PromptTemplate;
