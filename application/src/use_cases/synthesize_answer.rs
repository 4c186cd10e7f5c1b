//! Chairman synthesis stage

use crate::ports::deliberation::{StageError, SynthesisStage};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::query_council::QueryCouncilUseCase;
use async_trait::async_trait;
use council_domain::{
    BackendResult, ChatMessage, CouncilResponseSet, Model, PromptTemplate, Question,
    RankingOutcome, Stage, Synthesis,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Default [`SynthesisStage`]: the chairman model writes the final answer
pub struct ChairmanSynthesisStage<G: LlmGateway + 'static> {
    query: QueryCouncilUseCase<G>,
    chairman: Model,
    progress: Arc<dyn ProgressNotifier>,
}

impl<G: LlmGateway + 'static> ChairmanSynthesisStage<G> {
    pub fn new(query: QueryCouncilUseCase<G>, chairman: Model) -> Self {
        Self {
            query,
            chairman,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn chairman(&self) -> &Model {
        &self.chairman
    }
}

#[async_trait]
impl<G: LlmGateway + 'static> SynthesisStage for ChairmanSynthesisStage<G> {
    async fn synthesize(
        &self,
        question: &Question,
        responses: &CouncilResponseSet,
        rankings: &Value,
    ) -> Result<Value, StageError> {
        if responses.all_failed() {
            warn!("Skipping synthesis: no council member responded");
            let synthesis = Synthesis::new(
                self.chairman.clone(),
                BackendResult::failure("All council models failed to respond"),
            );
            return Ok(serde_json::to_value(synthesis)?);
        }

        info!("Stage 3: synthesis by {}", self.chairman);

        // Rankings from another RankingStage may have a different shape
        let ranking_texts: Vec<(String, String)> =
            serde_json::from_value::<RankingOutcome>(rankings.clone())
                .map(|outcome| {
                    outcome
                        .rankings
                        .into_iter()
                        .map(|r| (r.model.to_string(), r.ranking))
                        .collect()
                })
                .unwrap_or_default();

        let answers: Vec<(String, String)> = responses
            .successes()
            .map(|(model, content)| (model.to_string(), content.to_string()))
            .collect();

        let prompt = PromptTemplate::synthesis_prompt(question.content(), &answers, &ranking_texts);

        let results = self
            .query
            .execute_with_progress(
                std::slice::from_ref(&self.chairman),
                &[ChatMessage::user(prompt)],
                Stage::Synthesis,
                self.progress.as_ref(),
            )
            .await;

        let result = results
            .get(&self.chairman)
            .cloned()
            .unwrap_or_else(|| BackendResult::failure("Chairman produced no result"));

        Ok(serde_json::to_value(Synthesis::new(
            self.chairman.clone(),
            result,
        ))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::PeerRanking;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ChairGateway {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmGateway for ChairGateway {
        async fn query(
            &self,
            _model: &Model,
            messages: &[ChatMessage],
            _timeout: Duration,
        ) -> BackendResult {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            BackendResult::success("the council concludes")
        }
    }

    fn setup() -> (Arc<ChairGateway>, ChairmanSynthesisStage<ChairGateway>) {
        let gw = Arc::new(ChairGateway {
            prompts: Mutex::new(Vec::new()),
        });
        let stage =
            ChairmanSynthesisStage::new(QueryCouncilUseCase::new(Arc::clone(&gw)), Model::new("chair"));
        (gw, stage)
    }

    #[tokio::test]
    async fn test_synthesis_includes_answers_and_rankings() {
        let (gw, stage) = setup();
        let responses: CouncilResponseSet = vec![
            (Model::new("m1"), BackendResult::success("answer one")),
            (Model::new("m2"), BackendResult::failure("HTTP 500")),
        ]
        .into_iter()
        .collect();
        let rankings = serde_json::to_value(RankingOutcome {
            rankings: vec![PeerRanking {
                model: Model::new("m1"),
                ranking: "ranking text".to_string(),
                parsed_ranking: vec![],
            }],
            ..Default::default()
        })
        .unwrap();

        let question = Question::new("q?").unwrap();
        let value = stage.synthesize(&question, &responses, &rankings).await.unwrap();
        let synthesis: Synthesis = serde_json::from_value(value).unwrap();

        assert_eq!(synthesis.model, Model::new("chair"));
        assert_eq!(synthesis.result.content(), Some("the council concludes"));

        let prompts = gw.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("answer one"));
        assert!(prompts[0].contains("ranking text"));
        assert!(!prompts[0].contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_synthesis_skipped_when_all_failed() {
        let (gw, stage) = setup();
        let responses: CouncilResponseSet =
            vec![(Model::new("m1"), BackendResult::failure("down"))]
                .into_iter()
                .collect();

        let question = Question::new("q?").unwrap();
        let value = stage
            .synthesize(&question, &responses, &Value::Null)
            .await
            .unwrap();
        let synthesis: Synthesis = serde_json::from_value(value).unwrap();

        assert!(!synthesis.result.is_success());
        assert!(gw.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_tolerates_foreign_ranking_shape() {
        let (gw, stage) = setup();
        let responses: CouncilResponseSet =
            vec![(Model::new("m1"), BackendResult::success("answer"))]
                .into_iter()
                .collect();

        let question = Question::new("q?").unwrap();
        let value = stage
            .synthesize(&question, &responses, &serde_json::json!(["opaque"]))
            .await
            .unwrap();
        let synthesis: Synthesis = serde_json::from_value(value).unwrap();

        assert!(synthesis.result.is_success());
        assert!(!gw.prompts.lock().unwrap()[0].contains("STAGE 2"));
    }
}
