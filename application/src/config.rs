//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave,
//! such as council membership and API timeouts.

use council_domain::Model;
use std::time::Duration;

/// Default per-call timeout for backend requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Council composition and call limits.
#[derive(Debug, Clone)]
pub struct CouncilConfig {
    /// Models queried in parallel for stage 1 (and rankers in stage 2)
    pub models: Vec<Model>,
    /// Model that writes the stage 3 synthesis
    pub chairman: Model,
    /// Maximum time to wait for a single backend response
    pub timeout: Duration,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            models: Model::default_council(),
            chairman: Model::default_chairman(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CouncilConfig {
    pub fn new(models: Vec<Model>, chairman: Model) -> Self {
        Self {
            models,
            chairman,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a config with a timeout specified in seconds.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }
}
