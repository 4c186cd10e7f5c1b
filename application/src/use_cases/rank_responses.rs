//! Peer ranking stage
//!
//! Every council member that answered in stage 1 ranks the anonymized
//! answers; the parsed rankings are aggregated into an average position per
//! model.

use crate::ports::deliberation::{RankingStage, StageError};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::query_council::QueryCouncilUseCase;
use async_trait::async_trait;
use council_domain::{
    ChatMessage, CouncilResponseSet, Model, PeerRanking, PromptTemplate, Question,
    RankingFailure, RankingOutcome, Stage, aggregate_rankings, parse_ranking, response_label,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Default [`RankingStage`]: anonymized peer ranking by the council itself
pub struct PeerRankingStage<G: LlmGateway + 'static> {
    query: QueryCouncilUseCase<G>,
    progress: Arc<dyn ProgressNotifier>,
}

impl<G: LlmGateway + 'static> PeerRankingStage<G> {
    pub fn new(query: QueryCouncilUseCase<G>) -> Self {
        Self {
            query,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Build the label map and the labeled answers for the prompt
    fn anonymize(
        responses: &CouncilResponseSet,
    ) -> (BTreeMap<String, Model>, Vec<(String, String)>, Vec<Model>) {
        let mut label_to_model = BTreeMap::new();
        let mut labeled = Vec::new();
        let mut rankers = Vec::new();

        for (index, (model, content)) in responses.successes().enumerate() {
            let Some(label) = response_label(index) else {
                debug!("Skipping {} from ranking: too many responses", model);
                continue;
            };
            label_to_model.insert(label.clone(), model.clone());
            labeled.push((label, content.to_string()));
            rankers.push(model.clone());
        }

        (label_to_model, labeled, rankers)
    }
}

#[async_trait]
impl<G: LlmGateway + 'static> RankingStage for PeerRankingStage<G> {
    async fn rank(
        &self,
        question: &Question,
        responses: &CouncilResponseSet,
    ) -> Result<Value, StageError> {
        let (label_to_model, labeled, rankers) = Self::anonymize(responses);

        if labeled.len() < 2 {
            debug!("Skipping ranking: {} successful responses", labeled.len());
            let outcome = RankingOutcome {
                label_to_model,
                ..Default::default()
            };
            return Ok(serde_json::to_value(outcome)?);
        }

        info!("Stage 2: {} models ranking {} responses", rankers.len(), labeled.len());

        let prompt = PromptTemplate::ranking_prompt(question.content(), &labeled);
        let results = self
            .query
            .execute_with_progress(
                &rankers,
                &[ChatMessage::user(prompt)],
                Stage::Rankings,
                self.progress.as_ref(),
            )
            .await;

        let rankings: Vec<PeerRanking> = results
            .successes()
            .map(|(model, text)| PeerRanking {
                model: model.clone(),
                ranking: text.to_string(),
                parsed_ranking: parse_ranking(text),
            })
            .collect();

        let failures: Vec<RankingFailure> = results
            .failures()
            .map(|(model, reason)| RankingFailure {
                model: model.clone(),
                reason: reason.to_string(),
            })
            .collect();

        let aggregate = aggregate_rankings(&rankings, &label_to_model);

        let outcome = RankingOutcome {
            rankings,
            label_to_model,
            aggregate_rankings: aggregate,
            failures,
        };
        Ok(serde_json::to_value(outcome)?)
    }
}
