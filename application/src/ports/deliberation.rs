//! Deliberation ports
//!
//! Stage 2 (ranking) and stage 3 (synthesis) of a council turn. Their
//! outputs are opaque JSON to the orchestrator and the store.

use async_trait::async_trait;
use council_domain::{CouncilResponseSet, Question};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a deliberation stage
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Ranking failed: {0}")]
    Ranking(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stage 2: compare the council's responses
#[async_trait]
pub trait RankingStage: Send + Sync {
    async fn rank(
        &self,
        question: &Question,
        responses: &CouncilResponseSet,
    ) -> Result<Value, StageError>;
}

/// Stage 3: produce the final answer from stages 1 and 2
#[async_trait]
pub trait SynthesisStage: Send + Sync {
    async fn synthesize(
        &self,
        question: &Question,
        responses: &CouncilResponseSet,
        rankings: &Value,
    ) -> Result<Value, StageError>;
}
