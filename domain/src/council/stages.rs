//! Stage 2 and stage 3 result types.
//!
//! These are the payloads produced by the default ranking and synthesis
//! stages. The conversation store treats them as opaque JSON.

use super::value_objects::BackendResult;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three stages of a council turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Stage 1: every member answers independently
    Responses,
    /// Stage 2: members rank each other's answers
    Rankings,
    /// Stage 3: the chairman synthesizes the final answer
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Responses => "responses",
            Stage::Rankings => "rankings",
            Stage::Synthesis => "synthesis",
        }
    }

    /// 1-based stage number
    pub fn number(&self) -> u8 {
        match self {
            Stage::Responses => 1,
            Stage::Rankings => 2,
            Stage::Synthesis => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One council member's ranking of the anonymized responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRanking {
    /// The model that produced the ranking
    pub model: Model,
    /// Raw ranking text returned by the model
    pub ranking: String,
    /// Response labels in ranked order, best first
    pub parsed_ranking: Vec<String>,
}

/// Average position of one model across all peer rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRank {
    pub model: Model,
    /// Mean 1-based position, lower is better
    pub average_rank: f64,
    /// Number of rankings that placed this model
    pub rankings_count: usize,
}

/// Complete stage 2 result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub rankings: Vec<PeerRanking>,
    /// Anonymous label ("Response A") to the model that wrote it
    pub label_to_model: BTreeMap<String, Model>,
    /// Models ordered by average rank, best first
    pub aggregate_rankings: Vec<AggregateRank>,
    /// Rankers that failed to respond
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RankingFailure>,
}

/// A council member that could not produce a ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingFailure {
    pub model: Model,
    pub reason: String,
}

/// Complete stage 3 result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    /// The chairman model
    pub model: Model,
    #[serde(flatten)]
    pub result: BackendResult,
}

impl Synthesis {
    pub fn new(model: Model, result: BackendResult) -> Self {
        Self { model, result }
    }
}
