//! OpenAI-compatible chat completions adapter
//!
//! Talks to any endpoint speaking the `/chat/completions` protocol. The
//! default is Groq's hosted API.

use async_trait::async_trait;
use council_application::ports::llm_gateway::{GatewayError, LlmGateway};
use council_domain::{BackendResult, ChatMessage, Model};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Upper bound on how much of an unparseable error body ends up in a reason
const MAX_ERROR_BODY: usize = 200;

// ==================== Wire types ====================

#[derive(Debug, Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    #[serde(default)]
    choices: Vec<ChatApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatApiChoice {
    message: Option<ChatApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatApiMessage {
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatApiErrorBody {
    error: ChatApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatApiErrorDetail {
    message: Option<String>,
}

// ==================== Adapter ====================

/// [`LlmGateway`] over an OpenAI-compatible HTTP API
#[derive(Debug, Clone)]
pub struct ChatCompletionsGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ChatCompletionsGateway {
    /// Create a gateway. A missing key is not an error here; every query
    /// then fails with [`GatewayError::MissingCredential`].
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Transport {
                kind: "client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<BackendResult, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GatewayError::MissingCredential("no API key configured".to_string())
        })?;

        let auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            GatewayError::MissingCredential("API key contains invalid characters".to_string())
        })?;

        let body = ChatApiRequest {
            model: model.as_str(),
            messages,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, auth)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_transport(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::map_transport(e, timeout))?;

        debug!(
            "{} answered HTTP {} in {:?} ({} bytes)",
            model,
            status.as_u16(),
            start.elapsed(),
            text.len()
        );

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: Self::error_message(&text, status),
            });
        }

        Self::parse_success(&text)
    }

    fn parse_success(text: &str) -> Result<BackendResult, GatewayError> {
        let parsed: ChatApiResponse = serde_json::from_str(text)
            .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {e}")))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::MalformedResponse("no choices in response".to_string()))?
            .message
            .ok_or_else(|| GatewayError::MalformedResponse("choice without message".to_string()))?;

        let content = message.content.ok_or(GatewayError::EmptyResponse)?;
        let reasoning = message
            .reasoning
            .or(message.reasoning_content)
            .filter(|r| !r.trim().is_empty());

        Ok(BackendResult::Success { content, reasoning })
    }

    /// Prefer the upstream `error.message`, then the raw body, then the
    /// canonical status text
    fn error_message(body: &str, status: reqwest::StatusCode) -> String {
        if let Ok(parsed) = serde_json::from_str::<ChatApiErrorBody>(body) {
            if let Some(message) = parsed.error.message.filter(|m| !m.is_empty()) {
                return message;
            }
        }

        let trimmed = body.trim();
        if !trimmed.is_empty() {
            return trimmed.chars().take(MAX_ERROR_BODY).collect();
        }

        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    }

    fn map_transport(err: reqwest::Error, timeout: Duration) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(timeout)
        } else if err.is_connect() {
            GatewayError::Transport {
                kind: "connect".to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            GatewayError::MalformedResponse(err.to_string())
        } else {
            GatewayError::Transport {
                kind: "request".to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmGateway for ChatCompletionsGateway {
    async fn query(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> BackendResult {
        BackendResult::from(self.request(model, messages, timeout).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer, key: Option<&str>) -> ChatCompletionsGateway {
        ChatCompletionsGateway::new(
            format!("{}/chat/completions", server.uri()),
            key.map(str::to_string),
        )
        .unwrap()
    }

    fn hello() -> Vec<ChatMessage> {
        vec![ChatMessage::user("Hello")]
    }

    #[tokio::test]
    async fn test_success_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b-instant",
                "messages": [{ "role": "user", "content": "Hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hi there" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(
                &Model::new("llama-3.1-8b-instant"),
                &hello(),
                Duration::from_secs(5),
            )
            .await;

        assert_eq!(result, BackendResult::success("Hi there"));
    }

    #[tokio::test]
    async fn test_reasoning_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "42", "reasoning": "thought hard" } }]
            })))
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(&Model::new("openai/gpt-oss-20b"), &hello(), Duration::from_secs(5))
            .await;

        match result {
            BackendResult::Success { content, reasoning } => {
                assert_eq!(content, "42");
                assert_eq!(reasoning.as_deref(), Some("thought hard"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gw = gateway(&server, None);
        assert!(!gw.has_credentials());
        let result = gw
            .query(&Model::new("m"), &hello(), Duration::from_secs(5))
            .await;

        assert!(!result.is_success());
        assert!(result.reason().unwrap().contains("Missing API key"));
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "The model `nope` does not exist" }
            })))
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(&Model::new("nope"), &hello(), Duration::from_secs(5))
            .await;

        let reason = result.reason().unwrap();
        assert!(reason.contains("404"), "{}", reason);
        assert!(reason.contains("does not exist"), "{}", reason);
    }

    #[tokio::test]
    async fn test_http_error_with_plain_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(&Model::new("m"), &hello(), Duration::from_secs(5))
            .await;

        assert_eq!(result.reason(), Some("HTTP 502 - bad gateway"));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
            )
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(&Model::new("m"), &hello(), Duration::from_millis(200))
            .await;

        assert!(result.reason().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_malformed_and_empty_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = gateway(&server, Some("sk-test"))
            .query(&Model::new("m"), &hello(), Duration::from_secs(5))
            .await;
        assert!(result.reason().unwrap().starts_with("Malformed response"));

        assert_eq!(
            ChatCompletionsGateway::parse_success(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(GatewayError::EmptyResponse)
        );
        assert!(matches!(
            ChatCompletionsGateway::parse_success(r#"{"choices":[]}"#),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // Port 9 (discard) on localhost is essentially never listening
        let gw = ChatCompletionsGateway::new(
            "http://127.0.0.1:9/chat/completions",
            Some("sk-test".to_string()),
        )
        .unwrap();

        let result = gw
            .query(&Model::new("m"), &hello(), Duration::from_secs(2))
            .await;
        assert!(!result.is_success());
    }
}
