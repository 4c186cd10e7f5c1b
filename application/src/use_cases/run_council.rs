//! Run Council use case
//!
//! Orchestrates one council turn: record the user's question, fan it out to
//! the council, rank, synthesize, and persist the three stage payloads.

use crate::config::CouncilConfig;
use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::deliberation::{RankingStage, StageError, SynthesisStage};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::query_council::QueryCouncilUseCase;
use council_domain::{ChatMessage, CouncilResponseSet, DomainError, Model, Question, Stage};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during a council turn
#[derive(Error, Debug)]
pub enum RunCouncilError {
    #[error("No council models configured")]
    NoModels,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DomainError> for RunCouncilError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NoModels => RunCouncilError::NoModels,
            other => RunCouncilError::InvalidQuestion(other.to_string()),
        }
    }
}

/// Input for the RunCouncil use case
#[derive(Debug, Clone)]
pub struct RunCouncilInput {
    /// Existing conversation to append to
    pub conversation_id: String,
    /// Raw user text
    pub question: String,
}

impl RunCouncilInput {
    pub fn new(conversation_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            question: question.into(),
        }
    }
}

/// Everything produced by one council turn
#[derive(Debug, Clone)]
pub struct CouncilTurn {
    pub conversation_id: String,
    pub question: Question,
    /// Title assigned on this turn, if the conversation was still untitled
    pub title: Option<String>,
    pub responses: CouncilResponseSet,
    pub stage1: Value,
    pub stage2: Value,
    pub stage3: Value,
}

/// Use case for running one full council turn
pub struct RunCouncilUseCase<G: LlmGateway + 'static, S: ConversationStore + ?Sized> {
    query: QueryCouncilUseCase<G>,
    store: Arc<S>,
    ranking: Arc<dyn RankingStage>,
    synthesis: Arc<dyn SynthesisStage>,
    models: Vec<Model>,
}

impl<G: LlmGateway + 'static, S: ConversationStore + ?Sized> RunCouncilUseCase<G, S> {
    pub fn new(
        query: QueryCouncilUseCase<G>,
        store: Arc<S>,
        ranking: Arc<dyn RankingStage>,
        synthesis: Arc<dyn SynthesisStage>,
        config: &CouncilConfig,
    ) -> Self {
        Self {
            query,
            store,
            ranking,
            synthesis,
            models: config.models.clone(),
        }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunCouncilInput) -> Result<CouncilTurn, RunCouncilError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks for stage 1
    ///
    /// The user message is persisted before any backend call, so a turn that
    /// fails in a later stage still leaves the question in the history.
    pub async fn execute_with_progress(
        &self,
        input: RunCouncilInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<CouncilTurn, RunCouncilError> {
        if self.models.is_empty() {
            return Err(RunCouncilError::NoModels);
        }
        let question = Question::new(input.question)?;
        let conversation_id = input.conversation_id;

        let conversation = self
            .store
            .get_conversation(&conversation_id)
            .await?
            .ok_or_else(|| RunCouncilError::ConversationNotFound(conversation_id.clone()))?;

        let first_turn = conversation.user_turns() == 0;

        self.store
            .add_user_message(&conversation_id, question.content())
            .await?;

        let title = if first_turn && conversation.has_default_title() {
            let title = question.title_snippet();
            self.store
                .update_conversation_title(&conversation_id, &title)
                .await?;
            debug!("Titled conversation {} as {:?}", conversation_id, title);
            Some(title)
        } else {
            None
        };

        info!(
            "Council turn for {} with {} models",
            conversation_id,
            self.models.len()
        );

        // Stage 1
        let responses = self
            .query
            .execute_with_progress(
                &self.models,
                &[ChatMessage::user(question.content())],
                Stage::Responses,
                progress,
            )
            .await;
        if responses.all_failed() {
            warn!("Every council member failed; continuing with a degraded turn");
        }

        // Stage 2
        let stage2 = self.ranking.rank(&question, &responses).await?;

        // Stage 3
        let stage3 = self
            .synthesis
            .synthesize(&question, &responses, &stage2)
            .await?;

        let stage1 = serde_json::to_value(&responses)?;
        self.store
            .add_assistant_message(&conversation_id, &stage1, &stage2, &stage3)
            .await?;

        info!("Council turn for {} recorded", conversation_id);

        Ok(CouncilTurn {
            conversation_id,
            question,
            title,
            responses,
            stage1,
            stage2,
            stage3,
        })
    }
}
