//! Query Council use case
//!
//! Fans one request out to every council member concurrently and joins all
//! of the results into a [`CouncilResponseSet`].

use crate::config::DEFAULT_TIMEOUT;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use council_domain::{BackendResult, ChatMessage, CouncilResponseSet, Model, Stage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Use case for querying every council member in parallel
///
/// Stateless: each call spawns its own tasks and shares nothing with other
/// calls, so one instance can serve concurrent turns.
pub struct QueryCouncilUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G: LlmGateway + 'static> Clone for QueryCouncilUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            timeout: self.timeout,
        }
    }
}

impl<G: LlmGateway + 'static> QueryCouncilUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, models: &[Model], messages: &[ChatMessage]) -> CouncilResponseSet {
        self.execute_with_progress(models, messages, Stage::Responses, &NoProgress)
            .await
    }

    /// Query every model and wait for all of them to finish.
    ///
    /// The returned set has exactly one entry per distinct model in
    /// `models`. A model whose call fails, times out or whose task dies is
    /// recorded as [`BackendResult::Failure`]; it never delays or cancels
    /// the other calls beyond its own deadline.
    pub async fn execute_with_progress(
        &self,
        models: &[Model],
        messages: &[ChatMessage],
        stage: Stage,
        progress: &dyn ProgressNotifier,
    ) -> CouncilResponseSet {
        let models = Self::distinct(models);
        info!("Querying {} models ({})", models.len(), stage);
        progress.on_stage_start(stage, models.len());

        let messages: Arc<[ChatMessage]> = Arc::from(messages);
        let mut join_set = JoinSet::new();

        for (index, model) in models.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let model = model.clone();
            let messages = Arc::clone(&messages);
            let timeout = self.timeout;

            join_set.spawn(async move {
                let result = Self::query_model(gateway.as_ref(), &model, &messages, timeout).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<BackendResult>> = vec![None; models.len()];

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    let model = &models[index];
                    match &result {
                        BackendResult::Success { .. } => debug!("Model {} responded", model),
                        BackendResult::Failure { reason } => {
                            warn!("Model {} failed: {}", model, reason)
                        }
                    }
                    progress.on_model_complete(stage, model, result.is_success());
                    results[index] = Some(result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        let set = models
            .into_iter()
            .zip(results)
            .map(|(model, result)| {
                let result = result.unwrap_or_else(|| {
                    progress.on_model_complete(stage, &model, false);
                    BackendResult::failure("Query task terminated before completing")
                });
                (model, result)
            })
            .collect::<CouncilResponseSet>();

        progress.on_stage_complete(stage);
        info!(
            "{} of {} models responded ({})",
            set.success_count(),
            set.len(),
            stage
        );
        set
    }

    /// Query a single model, bounded by `timeout` even if the gateway is not
    async fn query_model(
        gateway: &G,
        model: &Model,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> BackendResult {
        match tokio::time::timeout(timeout, gateway.query(model, messages, timeout)).await {
            Ok(result) => result,
            Err(_) => BackendResult::failure(GatewayError::Timeout(timeout).to_string()),
        }
    }

    /// Drop repeated identifiers, keeping the first occurrence
    fn distinct(models: &[Model]) -> Vec<Model> {
        let mut seen = HashSet::new();
        models
            .iter()
            .filter(|m| {
                let fresh = seen.insert(*m);
                if !fresh {
                    warn!("Ignoring duplicate council member {}", m);
                }
                fresh
            })
            .cloned()
            .collect()
    }
}
