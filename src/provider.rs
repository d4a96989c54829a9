//! Model Provider Abstraction
//!
//! Unified interface for calling a chat-completions backend. OpenRouter, OpenAI and
//! custom local servers all speak the same OpenAI-compatible wire format, so one
//! client serves all three. Structured output is forced through a single tool.

use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Backend flavour. Only affects the default endpoint and whether a key is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "local")]
    LocalCustom,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenRouter => "openrouter",
            ProviderType::OpenAI => "openai",
            ProviderType::LocalCustom => "local",
        }
    }

    fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenRouter => Some(OPENROUTER_BASE_URL),
            ProviderType::OpenAI => Some(OPENAI_BASE_URL),
            ProviderType::LocalCustom => None,
        }
    }

    fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderType::LocalCustom)
    }
}

/// Provider section of the site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Primary model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Model tried once when the primary fails for a non-connection reason
    #[serde(default)]
    pub fallback_model: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override (e.g. http://localhost:8080/v1)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            fallback_model: None,
            api_key: None,
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        if self.model.trim().is_empty() {
            problems.push("model must not be empty".to_string());
        }
        if let Some(fallback) = &self.fallback_model {
            if fallback.trim().is_empty() {
                problems.push("fallback_model must not be empty when set".to_string());
            }
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                problems.push(format!("endpoint must be an http(s) URL: {}", endpoint));
            }
        } else if self.provider_type == ProviderType::LocalCustom {
            problems.push("local provider requires an endpoint".to_string());
        }
        if self.request_timeout_secs == 0 {
            problems.push("request_timeout_secs must be positive".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }

    pub fn base_url(&self) -> Result<String, ProviderError> {
        self.endpoint
            .clone()
            .or_else(|| self.provider_type.default_base_url().map(str::to_string))
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "no endpoint configured for {} provider",
                    self.provider_type.as_str()
                ))
            })
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A function schema the backend is forced to call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Completion options
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tool: Option<ToolSpec>,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Free-text content of the first choice
    pub content: String,
    /// Serialized arguments of the first tool call, when the backend made one
    pub tool_payload: Option<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    /// The structured payload if present, otherwise the free text.
    pub fn into_text(self) -> String {
        self.tool_payload.unwrap_or(self.content)
    }
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Deserialize)]
struct ToolFunction {
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

impl ErrorBody {
    fn code_string(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn build_request<'a>(
    model: &'a str,
    messages: &'a [ChatMessage],
    options: &CompletionOptions,
) -> ChatCompletionRequest<'a> {
    let (tools, tool_choice) = match &options.tool {
        Some(tool) => (
            Some(vec![json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })]),
            Some(json!({ "type": "function", "function": { "name": tool.name } })),
        ),
        None => (None, None),
    };
    ChatCompletionRequest {
        model,
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        tools,
        tool_choice,
        stream: false,
    }
}

// Helper function to map transport errors to ProviderError
fn map_http_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else if error.is_connect() {
        ProviderError::Connection(error.to_string())
    } else {
        ProviderError::Provider(format!("HTTP error: {}", error))
    }
}

/// Map a non-2xx status and its body onto the error taxonomy.
fn map_status_error(status: u16, body: &str) -> ProviderError {
    let (message, code) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope.error.code_string();
            (envelope.error.message, code)
        }
        Err(_) => (body.trim().to_string(), None),
    };
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        message
    };
    match status {
        401 => ProviderError::AuthFailed(message),
        429 => ProviderError::RateLimit(message),
        404 => ProviderError::ModelNotFound(message),
        _ => ProviderError::RequestFailed {
            status: Some(status),
            code,
            message,
        },
    }
}

/// Turn a 2xx body into a completion, honoring in-band error objects.
fn parse_completion_body(body: &str, requested_model: &str) -> Result<CompletionResponse, ProviderError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Provider(format!("Failed to parse response: {}", e)))?;

    if let Some(err) = completion.error {
        let code = err.code_string();
        let status = code.as_deref().and_then(|c| c.parse::<u16>().ok());
        return Err(match status {
            Some(s) => map_status_error(
                s,
                &json!({ "error": { "message": err.message, "code": code } }).to_string(),
            ),
            None => ProviderError::RequestFailed {
                status: None,
                code,
                message: err.message,
            },
        });
    }

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Provider("No choices in response".to_string()))?;

    let tool_payload = choice.message.tool_calls.into_iter().next().map(|call| {
        match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(value) => value.to_string(),
            Err(_) => call.function.arguments,
        }
    });

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_payload,
        model: completion
            .model
            .unwrap_or_else(|| requested_model.to_string()),
        usage: completion.usage.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_provider_http_client(request_timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ProviderError::Provider(format!("Failed to create HTTP client: {}", e)))
}

/// OpenAI-compatible chat-completions client
pub struct ChatCompletionsClient {
    client: Client,
    provider_type: ProviderType,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl ChatCompletionsClient {
    /// Build a client for `model` using the connection settings in `config`.
    pub fn new(config: &ProviderConfig, model: &str) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());
        if api_key.is_none() && config.provider_type.requires_api_key() {
            return Err(ProviderError::NotConfigured(format!(
                "{} provider requires an API key (set OPENROUTER_API_KEY)",
                config.provider_type.as_str()
            )));
        }
        let client =
            build_provider_http_client(Duration::from_secs(config.request_timeout_secs.max(1)))?;
        Ok(Self {
            client,
            provider_type: config.provider_type,
            model: model.to_string(),
            api_key,
            base_url: config.base_url()?,
        })
    }
}

#[async_trait]
impl ModelProviderClient for ChatCompletionsClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = build_request(&self.model, &messages, &options);
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        if self.provider_type == ProviderType::OpenRouter {
            builder = builder.header("X-Title", "sitesmith");
        }

        let response = builder.send().await.map_err(map_http_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;

        if !status.is_success() {
            return Err(map_status_error(status.as_u16(), &body));
        }

        parse_completion_body(&body, &self.model)
    }

    fn provider_name(&self) -> &str {
        self.provider_type.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Scripted provider for unit tests. Each call pops the next scripted outcome;
/// once exhausted the last outcome repeats.
#[cfg(test)]
pub struct MockProvider {
    model_name: String,
    responses: Vec<Result<String, ProviderError>>,
    current: std::sync::Arc<std::sync::Mutex<usize>>,
    pub seen: std::sync::Arc<std::sync::Mutex<Vec<CompletionOptions>>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(model_name: &str, responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            model_name: model_name.to_string(),
            responses,
            current: std::sync::Arc::new(std::sync::Mutex::new(0)),
            seen: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        *self.current.lock().unwrap()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.seen.lock().unwrap().push(options);
        let mut idx = self.current.lock().unwrap();
        let outcome = self
            .responses
            .get(*idx)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| Ok("{}".to_string()));
        *idx += 1;
        outcome.map(|content| CompletionResponse {
            content,
            tool_payload: None,
            model: self.model_name.clone(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_forces_tool_choice() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let options = CompletionOptions {
            temperature: Some(0.2),
            max_tokens: Some(512),
            tool: Some(ToolSpec {
                name: "emit_section".to_string(),
                description: "Emit one section".to_string(),
                parameters: json!({ "type": "object" }),
            }),
        };
        let request = build_request("m", &messages, &options);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"]["function"]["name"], "emit_section");
        assert_eq!(value["tools"][0]["function"]["name"], "emit_section");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["max_tokens"], 512);
    }

    #[test]
    fn test_request_without_tool_omits_fields() {
        let messages = vec![ChatMessage::user("hi")];
        let request = build_request("m", &messages, &CompletionOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_tool_call_payload_wins_over_content() {
        let body = r#"{
            "model": "x/y",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{"function": {"name": "f", "arguments": "{\"a\": 1}"}}]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let response = parse_completion_body(body, "x/y").unwrap();
        assert_eq!(response.tool_payload.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(response.into_text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_plain_content_response() {
        let body = r#"{"choices":[{"message":{"content":"hello"}}]}"#;
        let response = parse_completion_body(body, "fallback-name").unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(response.model, "fallback-name");
        assert!(response.tool_payload.is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(401, r#"{"error":{"message":"bad key"}}"#),
            ProviderError::AuthFailed(m) if m == "bad key"
        ));
        assert!(matches!(
            map_status_error(429, "slow down"),
            ProviderError::RateLimit(_)
        ));
        let err = map_status_error(
            402,
            r#"{"error":{"message":"You requested up to 8000 tokens, but can only afford 1200","code":402}}"#,
        );
        assert_eq!(err.status(), Some(402));
        assert_eq!(err.code(), Some("402"));
        assert!(err.message().contains("can only afford 1200"));
    }

    #[test]
    fn test_in_band_error_is_surfaced() {
        let body = r#"{"error":{"message":"upstream overloaded","code":"overloaded"}}"#;
        let err = parse_completion_body(body, "m").unwrap_err();
        assert_eq!(err.code(), Some("overloaded"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProviderConfig::default();
        assert!(config.validate().is_ok());
        config.provider_type = ProviderType::LocalCustom;
        assert!(config.validate().is_err());
        config.endpoint = Some("http://localhost:8080/v1/".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url().unwrap(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_client_requires_key_for_hosted_backends() {
        let config = ProviderConfig::default();
        assert!(matches!(
            ChatCompletionsClient::new(&config, "m"),
            Err(ProviderError::NotConfigured(_))
        ));
        let local = ProviderConfig {
            provider_type: ProviderType::LocalCustom,
            endpoint: Some("http://localhost:8080/v1".to_string()),
            ..Default::default()
        };
        let client = ChatCompletionsClient::new(&local, "llama3").unwrap();
        assert_eq!(client.provider_name(), "local");
        assert_eq!(client.model_name(), "llama3");
    }

    #[test]
    fn test_message_role_serialization() {
        let serialized = serde_json::to_string(&MessageRole::System).unwrap();
        assert_eq!(serialized, "\"system\"");
    }

    #[tokio::test]
    async fn test_mock_provider_repeats_last() {
        let mock = MockProvider::new("mock-model", vec![Ok("one".to_string()), Ok("two".to_string())]);
        let first = mock.complete(vec![], CompletionOptions::default()).await.unwrap();
        let second = mock.complete(vec![], CompletionOptions::default()).await.unwrap();
        let third = mock.complete(vec![], CompletionOptions::default()).await.unwrap();
        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert_eq!(third.content, "two");
        assert_eq!(mock.calls(), 3);
    }
}
