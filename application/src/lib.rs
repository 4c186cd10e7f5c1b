//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CouncilConfig, DEFAULT_TIMEOUT};
pub use ports::{
    conversation_store::{ConversationStore, StoreError},
    deliberation::{RankingStage, StageError, SynthesisStage},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::check_backends::{CHECK_TIMEOUT, CheckBackendsUseCase};
pub use use_cases::query_council::QueryCouncilUseCase;
pub use use_cases::rank_responses::PeerRankingStage;
pub use use_cases::run_council::{CouncilTurn, RunCouncilError, RunCouncilInput, RunCouncilUseCase};
pub use use_cases::synthesize_answer::ChairmanSynthesisStage;
