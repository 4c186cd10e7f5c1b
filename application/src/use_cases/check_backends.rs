//! Check Backends use case
//!
//! Connectivity diagnostic: greets every council member and the chairman
//! once with a short timeout.

use crate::config::CouncilConfig;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::query_council::QueryCouncilUseCase;
use council_domain::{ChatMessage, CouncilResponseSet, Model, Stage};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Timeout used by the diagnostic, much shorter than a real turn
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const CHECK_PROMPT: &str = "Hello";

pub struct CheckBackendsUseCase<G: LlmGateway + 'static> {
    query: QueryCouncilUseCase<G>,
    models: Vec<Model>,
}

impl<G: LlmGateway + 'static> CheckBackendsUseCase<G> {
    pub fn new(gateway: Arc<G>, config: &CouncilConfig) -> Self {
        let mut models = config.models.clone();
        if !models.contains(&config.chairman) {
            models.push(config.chairman.clone());
        }
        Self {
            query: QueryCouncilUseCase::new(gateway).with_timeout(CHECK_TIMEOUT),
            models,
        }
    }

    /// Models that will be checked, council first then chairman
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub async fn execute(&self) -> CouncilResponseSet {
        self.execute_with_progress(&NoProgress).await
    }

    pub async fn execute_with_progress(&self, progress: &dyn ProgressNotifier) -> CouncilResponseSet {
        info!("Checking {} backends", self.models.len());
        self.query
            .execute_with_progress(
                &self.models,
                &[ChatMessage::user(CHECK_PROMPT)],
                Stage::Responses,
                progress,
            )
            .await
    }
}
