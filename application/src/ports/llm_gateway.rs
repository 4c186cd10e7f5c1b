//! LLM Gateway port
//!
//! Defines the interface for sending chat-completion requests to model
//! backends.

use async_trait::async_trait;
use council_domain::{BackendResult, ChatMessage, Model};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a model backend
///
/// Adapters use these internally; at the port boundary every error is
/// flattened into [`BackendResult::Failure`] with the `Display` text as its
/// reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Missing API key: {0}")]
    MissingCredential(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error ({kind}): {message}")]
    Transport { kind: String, message: String },

    #[error("HTTP {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response contained no message content")]
    EmptyResponse,
}

/// Gateway for chat-completion requests
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one chat-completion request for `model`.
    ///
    /// Never returns an error: missing credentials, transport failures,
    /// timeouts and protocol errors all resolve to
    /// [`BackendResult::Failure`]. The call must finish within `timeout`.
    async fn query(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> BackendResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reasons_carry_diagnostics() {
        let err = GatewayError::Status {
            status: 429,
            message: "Rate limit reached".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 429 - Rate limit reached");

        let err = GatewayError::Transport {
            kind: "connect".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Transport error (connect): connection refused");
    }

    #[test]
    fn test_error_flattens_into_failure() {
        let result: Result<BackendResult, GatewayError> =
            Err(GatewayError::MissingCredential("GROQ_API_KEY not set".to_string()));
        let flat = BackendResult::from(result);
        assert_eq!(flat.reason(), Some("Missing API key: GROQ_API_KEY not set"));
    }
}
