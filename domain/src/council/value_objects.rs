//! Council value objects - immutable result types for one fan-out.
//!
//! - [`BackendResult`] - outcome of querying one model
//! - [`CouncilEntry`] - a model paired with its result
//! - [`CouncilResponseSet`] - complete stage 1 result, one entry per model

use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of querying one backend model
///
/// Every backend call resolves to exactly one of these variants; transport,
/// protocol and configuration errors are all folded into `Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BackendResult {
    Success {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    Failure {
        reason: String,
    },
}

impl BackendResult {
    /// Creates a successful result without reasoning
    pub fn success(content: impl Into<String>) -> Self {
        BackendResult::Success {
            content: content.into(),
            reasoning: None,
        }
    }

    /// Creates a failed result carrying a diagnostic reason
    pub fn failure(reason: impl Into<String>) -> Self {
        BackendResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BackendResult::Success { .. })
    }

    /// Response text, if successful
    pub fn content(&self) -> Option<&str> {
        match self {
            BackendResult::Success { content, .. } => Some(content),
            BackendResult::Failure { .. } => None,
        }
    }

    /// Failure reason, if failed
    pub fn reason(&self) -> Option<&str> {
        match self {
            BackendResult::Success { .. } => None,
            BackendResult::Failure { reason } => Some(reason),
        }
    }
}

impl<E: std::fmt::Display> From<Result<BackendResult, E>> for BackendResult {
    fn from(result: Result<BackendResult, E>) -> Self {
        result.unwrap_or_else(|e| BackendResult::failure(e.to_string()))
    }
}

/// One model's entry in a [`CouncilResponseSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilEntry {
    pub model: Model,
    #[serde(flatten)]
    pub result: BackendResult,
}

impl CouncilEntry {
    pub fn new(model: Model, result: BackendResult) -> Self {
        Self { model, result }
    }
}

/// Complete result of one fan-out across the council
///
/// Holds exactly one entry per distinct model, in request order. Building
/// the set from an iterator keeps the first entry for a model and drops any
/// later duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouncilResponseSet {
    entries: Vec<CouncilEntry>,
}

impl CouncilResponseSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the result for a model
    pub fn get(&self, model: &Model) -> Option<&BackendResult> {
        self.entries
            .iter()
            .find(|e| &e.model == model)
            .map(|e| &e.result)
    }

    pub fn contains(&self, model: &Model) -> bool {
        self.get(model).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CouncilEntry> {
        self.entries.iter()
    }

    /// Models in request order
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.entries.iter().map(|e| &e.model)
    }

    /// Successful `(model, content)` pairs in request order
    pub fn successes(&self) -> impl Iterator<Item = (&Model, &str)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.content().map(|c| (&e.model, c)))
    }

    /// Failed `(model, reason)` pairs in request order
    pub fn failures(&self) -> impl Iterator<Item = (&Model, &str)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.reason().map(|r| (&e.model, r)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Returns `true` when no council member produced a response
    pub fn all_failed(&self) -> bool {
        self.success_count() == 0
    }
}

impl FromIterator<(Model, BackendResult)> for CouncilResponseSet {
    fn from_iter<I: IntoIterator<Item = (Model, BackendResult)>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let entries = iter
            .into_iter()
            .filter(|(model, _)| seen.insert(model.clone()))
            .map(|(model, result)| CouncilEntry::new(model, result))
            .collect();
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a CouncilResponseSet {
    type Item = &'a CouncilEntry;
    type IntoIter = std::slice::Iter<'a, CouncilEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
