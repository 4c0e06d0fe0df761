//! LLM completion clients.
//!
//! Provides a single-shot completion capability behind the [`LlmClient`]
//! trait so providers can plug in and tests can script responses. Two
//! providers ship: Anthropic (`/messages`) and OpenAI
//! (`/chat/completions`). Each call is independent; no conversation state
//! is held here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmSettings;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM calls
#[derive(Debug)]
pub enum LlmError {
    /// The request could not be sent or completed
    RequestFailed(String),
    /// The API answered with a non-success status
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        detail: String,
    },
    /// The response body did not carry usable completion text
    InvalidResponse(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::RequestFailed(msg) => write!(f, "LLM request failed: {}", msg),
            LlmError::Status { status, detail } => {
                write!(f, "LLM API returned {}: {}", status, detail)
            }
            LlmError::InvalidResponse(msg) => write!(f, "Invalid LLM response: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
}

impl Provider {
    /// Resolve a selector string. Unrecognized values fall back to
    /// Anthropic rather than erroring.
    pub fn from_selector(selector: &str) -> Self {
        match selector.to_lowercase().as_str() {
            "openai" => Provider::OpenAi,
            "anthropic" => Provider::Anthropic,
            _ => Provider::Anthropic,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// A single-shot completion capability: one prompt in, one text out
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Issue one completion request and return the response text
    async fn generate(&self, prompt: &str) -> LlmResult<String>;
}

/// Build a client for the selected provider, sharing the given HTTP client
pub fn client_for(
    provider: Provider,
    http: Client,
    settings: &LlmSettings,
) -> Box<dyn LlmClient> {
    match provider {
        Provider::Anthropic => Box::new(AnthropicClient::new(http, settings)),
        Provider::OpenAi => Box::new(OpenAiClient::new(http, settings)),
    }
}

// ============================================================================
// Anthropic
// ============================================================================

/// Client for the Anthropic messages API
pub struct AnthropicClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl AnthropicClient {
    /// Create a client from the given settings, reusing the shared HTTP client
    pub fn new(http: Client, settings: &LlmSettings) -> Self {
        Self {
            http,
            api_base: settings.anthropic_url.clone(),
            api_key: settings.anthropic_api_key.clone(),
            model: settings.anthropic_model.clone(),
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let url = format!("{}/messages", self.api_base.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::RequestFailed(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(LlmError::Status { status, detail });
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        let text = response
            .content
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "response missing content".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// OpenAI
// ============================================================================

/// Client for the OpenAI chat completions API
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a client from the given settings, reusing the shared HTTP client
    pub fn new(http: Client, settings: &LlmSettings) -> Self {
        Self {
            http,
            api_base: settings.openai_url.clone(),
            api_key: settings.openai_api_key.clone(),
            model: settings.openai_model.clone(),
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let url = format!(
            "{}/chat/completions",
            self.api_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::RequestFailed(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(LlmError::Status { status, detail });
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("response missing content".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings_for(server: &MockServer) -> LlmSettings {
        let mut settings = LlmSettings::defaults();
        settings.anthropic_url = server.base_url();
        settings.openai_url = server.base_url();
        settings.anthropic_api_key = "test-key".to_string();
        settings.openai_api_key = "test-key".to_string();
        settings
    }

    #[test]
    fn test_provider_from_selector() {
        assert_eq!(Provider::from_selector("anthropic"), Provider::Anthropic);
        assert_eq!(Provider::from_selector("OpenAI"), Provider::OpenAi);
        // Unrecognized selectors fall back to the default provider.
        assert_eq!(Provider::from_selector("gemini"), Provider::Anthropic);
        assert_eq!(Provider::from_selector(""), Provider::Anthropic);
    }

    #[tokio::test]
    async fn test_anthropic_generate_joins_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/messages")
                    .header("x-api-key", "test-key");
                then.status(200).json_body(json!({
                    "content": [{"type": "text", "text": "hello"}, {"type": "text", "text": "world"}]
                }));
            })
            .await;

        let client = AnthropicClient::new(Client::new(), &settings_for(&server));
        let text = client.generate("say hello").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "hello\nworld");
    }

    #[tokio::test]
    async fn test_anthropic_generate_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/messages");
                then.status(401).body("invalid api key");
            })
            .await;

        let client = AnthropicClient::new(Client::new(), &settings_for(&server));
        match client.generate("hi").await {
            Err(LlmError::Status { status, detail }) => {
                assert_eq!(status, 401);
                assert!(detail.contains("invalid api key"));
            }
            other => panic!("expected status error, got {:?}", other.map_err(|e| e.to_string())),
        }
    }

    #[tokio::test]
    async fn test_openai_generate_extracts_first_choice() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "plan text"}}]
                }));
            })
            .await;

        let client = OpenAiClient::new(Client::new(), &settings_for(&server));
        let text = client.generate("make a plan").await.unwrap();
        assert_eq!(text, "plan text");
    }

    #[tokio::test]
    async fn test_openai_generate_rejects_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let client = OpenAiClient::new(Client::new(), &settings_for(&server));
        assert!(matches!(
            client.generate("make a plan").await,
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
