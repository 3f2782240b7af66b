//! LLM Service
//!
//! Abstraction over the external decision provider (Ollama or any
//! OpenAI-compatible chat-completions endpoint)

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// LLM service error
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timeout")]
    Timeout,
    #[error("Service unavailable")]
    Unavailable,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// LLM Service trait
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Invoke LLM with system and user prompts
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;

    /// Check if service is available
    async fn health_check(&self) -> bool;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Ollama service configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            timeout_secs: 30,
            temperature: 0.2,
            max_tokens: 256,
        }
    }
}

/// JSON schema of a decision reply: an action plus the rank labels played
pub fn decision_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "enum": ["play", "pass"] },
            "cards": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["action"]
    })
}

fn chat_messages<'a>(system_prompt: &'a str, user_prompt: &'a str) -> Vec<ChatMessage<'a>> {
    vec![
        ChatMessage {
            role: "system",
            content: system_prompt,
        },
        ChatMessage {
            role: "user",
            content: user_prompt,
        },
    ]
}

/// Map provider status codes onto `LlmError`; 429 and 503 mean "try later"
async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    {
        warn!(provider, %status, "Provider unavailable");
        return Err(LlmError::Unavailable);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(provider, %status, body = %body, "Provider API error");
        return Err(LlmError::InvalidResponse(format!("Status: {}", status)));
    }
    Ok(response)
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    /// Constrains the reply to the decision schema
    format: serde_json::Value,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatReply,
}

/// Ollama chat client constrained to decision replies
pub struct OllamaService {
    client: Client,
    config: OllamaConfig,
}

impl OllamaService {
    pub fn new(config: OllamaConfig) -> Self {
        let client = build_client(config.timeout_secs);
        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Ollama decision provider configured"
        );
        Self { client, config }
    }

    fn request<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.config.model,
            messages: chat_messages(system_prompt, user_prompt),
            stream: false,
            format: decision_schema(),
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmService for OllamaService {
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let url = self.url("api/chat");
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&self.request(system_prompt, user_prompt))
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let result: OllamaChatResponse = response.json().await?;
        let content = result
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty decision".to_string()))?;
        debug!(elapsed = ?start.elapsed(), chars = content.len(), "Ollama decision received");
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(self.url("api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout_secs: 30,
            temperature: 0.2,
            max_tokens: 256,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible providers
pub struct OpenAiCompatibleService {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCompatibleService {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = build_client(config.timeout_secs);
        info!(
            "OpenAiCompatibleService initialized: {} (model: {})",
            config.base_url, config.model
        );
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl LlmService for OpenAiCompatibleService {
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let url = self.url("chat/completions");
        let request = ChatRequest {
            model: &self.config.model,
            messages: chat_messages(system_prompt, user_prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Calling chat completions API: {}", url);
        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await?;

        let response = check_status(self.name(), response).await?;

        let result: ChatResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }

    async fn health_check(&self) -> bool {
        match self.authorized(self.client.get(self.url("models"))).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Chat completions health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// One scripted reply of the mock provider
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail,
    /// Sleep before answering, to exercise timeouts
    Hang(Duration),
}

/// Mock LLM service for testing
///
/// Plays back scripted replies in order, then repeats the default response.
pub struct MockLlmService {
    response: String,
    script: Mutex<VecDeque<MockReply>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmService {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            response: r#"{"action":"pass"}"#.to_string(),
            script: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// User prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn invoke(&self, _system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(user_prompt.to_string());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail) => Err(LlmError::Unavailable),
            Some(MockReply::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Err(LlmError::Timeout)
            }
            None => Ok(self.response.clone()),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_service() {
        let service = MockLlmService::new("Test response");
        let result = service.invoke("system", "user").await;
        assert_eq!(result.unwrap(), "Test response");
        assert_eq!(service.prompts(), vec!["user".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_plays_script_in_order() {
        let service = MockLlmService::scripted(vec![
            MockReply::Fail,
            MockReply::Text("first".to_string()),
        ]);
        assert!(matches!(
            service.invoke("s", "a").await,
            Err(LlmError::Unavailable)
        ));
        assert_eq!(service.invoke("s", "b").await.unwrap(), "first");
        assert!(service.invoke("s", "c").await.unwrap().contains("pass"));
        assert_eq!(service.call_count(), 3);
    }

    #[test]
    fn test_ollama_request_is_schema_constrained_chat() {
        let service = OllamaService::new(OllamaConfig {
            base_url: "http://localhost:11434/".to_string(),
            model: "test".to_string(),
            timeout_secs: 1,
            temperature: 0.0,
            max_tokens: 64,
        });
        assert_eq!(service.url("api/chat"), "http://localhost:11434/api/chat");

        let body = serde_json::to_value(service.request("rules", "hand")).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hand");
        assert_eq!(body["options"]["num_predict"], 64);
        assert_eq!(
            body["format"]["properties"]["action"]["enum"],
            serde_json::json!(["play", "pass"])
        );
        assert_eq!(body["format"]["required"], serde_json::json!(["action"]));
    }

    #[test]
    fn test_openai_url_joins_cleanly() {
        let service = OpenAiCompatibleService::new(OpenAiConfig {
            base_url: "http://localhost:8000/v1/".to_string(),
            api_key: None,
            model: "test".to_string(),
            timeout_secs: 1,
            temperature: 0.0,
            max_tokens: 16,
        });
        assert_eq!(
            service.url("chat/completions"),
            "http://localhost:8000/v1/chat/completions"
        );
    }
}
