//! Chat-completion service with tool calling.
//!
//! [`CompletionClient`] talks to any OpenAI-compatible endpoint (Groq by
//! default). [`MockCompletionService`] replays a script for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use advisor_core::config::CompletionConfig;
use advisor_core::AdvisorError;

use crate::types::{ChatMessage, ModelResponse, ToolInvocation, WEATHER_TOOL};

// =============================================================================
// Error
// =============================================================================

/// Errors from a completion call.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion API key is not configured")]
    MissingApiKey,

    #[error("Completion API error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected completion payload: {0}")]
    Decode(String),

    #[error("Completion returned no choices")]
    EmptyResponse,
}

impl CompletionError {
    /// Whether the failure looks caused by the tool definitions or a
    /// malformed tool call. Such errors earn one retry with tools disabled.
    pub fn is_tool_related(&self) -> bool {
        let text = self.to_string().to_lowercase();
        text.contains("tool") || text.contains("function")
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

impl From<CompletionError> for AdvisorError {
    fn from(err: CompletionError) -> Self {
        AdvisorError::Completion(err.to_string())
    }
}

// =============================================================================
// Trait
// =============================================================================

/// A language model that can answer or request the weather capability.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one completion over `messages`. When `tools_enabled` is false the
    /// capability is not offered and the model must answer in text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools_enabled: bool,
    ) -> Result<ModelResponse, CompletionError>;
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireToolCall {
    id: String,
    r#type: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Serialize, Debug)]
struct ToolDefinition {
    r#type: &'static str,
    function: FunctionDefinition,
}

#[derive(Serialize, Debug)]
struct FunctionDefinition {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn weather_tool_definition() -> ToolDefinition {
    ToolDefinition {
        r#type: "function",
        function: FunctionDefinition {
            name: WEATHER_TOOL,
            description: "Get current weather information for a specific location. Use this tool ONLY when the user asks about weather, activities, or things related to weather conditions in a specific location.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city name or location to get weather for (e.g., 'Tokyo', 'New York', 'London')"
                    }
                },
                "required": ["location"]
            }),
        },
    }
}

fn to_wire(message: &ChatMessage) -> WireMessage {
    let mut wire = WireMessage {
        role: message.role().to_string(),
        content: Some(message.content().to_string()),
        tool_calls: None,
        tool_call_id: None,
        name: None,
    };
    match message {
        ChatMessage::Assistant { content, tool_calls } if !tool_calls.is_empty() => {
            if content.is_empty() {
                wire.content = None;
            }
            wire.tool_calls = Some(
                tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        r#type: "function".to_string(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect(),
            );
        }
        ChatMessage::Tool {
            tool_call_id, name, ..
        } => {
            wire.tool_call_id = Some(tool_call_id.clone());
            wire.name = Some(name.clone());
        }
        _ => {}
    }
    wire
}

fn from_wire(message: WireMessage) -> ModelResponse {
    match message.tool_calls {
        Some(calls) if !calls.is_empty() => ModelResponse::ToolRequest(
            calls
                .into_iter()
                .map(|call| ToolInvocation {
                    id: call.id,
                    name: call.function.name,
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::Value::Null),
                })
                .collect(),
        ),
        _ => ModelResponse::Text(message.content.unwrap_or_default()),
    }
}

fn map_http_error(status: StatusCode, body: String) -> CompletionError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    CompletionError::Provider {
        status: status.as_u16(),
        message,
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// OpenAI-compatible `/chat/completions` client.
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools_enabled: bool,
    ) -> Result<ModelResponse, CompletionError> {
        if self.api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: messages.iter().map(to_wire).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools_enabled.then(|| vec![weather_tool_definition()]),
            tool_choice: tools_enabled.then_some("auto"),
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools_enabled,
            "Requesting chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_http_error(status, body));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Decode(e.to_string()))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(from_wire(message))
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// A completion call observed by [`MockCompletionService`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tools_enabled: bool,
}

/// Completion service that replays scripted responses in order.
///
/// Once the script is exhausted it keeps returning the `repeat` response,
/// or [`CompletionError::EmptyResponse`] when none is set.
#[derive(Debug, Default)]
pub struct MockCompletionService {
    script: Mutex<VecDeque<Result<ModelResponse, CompletionError>>>,
    repeat: Option<ModelResponse>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that always gives the same response.
    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            repeat: Some(response),
            ..Self::default()
        }
    }

    /// A service that always answers with `text`.
    pub fn answering(text: &str) -> Self {
        Self::repeating(ModelResponse::Text(text.to_string()))
    }

    /// Queue a response.
    pub fn then(self, response: ModelResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a failure.
    pub fn then_fail(self, error: CompletionError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, step: Result<ModelResponse, CompletionError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools_enabled: bool,
    ) -> Result<ModelResponse, CompletionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                tools_enabled,
            });
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(step) => step,
            None => self.repeat.clone().ok_or(CompletionError::EmptyResponse),
        }
    }
}

/// Build a `get_weather` request for `location`, as a model would.
pub fn weather_request(location: &str) -> ModelResponse {
    ModelResponse::ToolRequest(vec![ToolInvocation {
        id: format!("call_{}", location.to_lowercase().replace(' ', "_")),
        name: WEATHER_TOOL.to_string(),
        arguments: serde_json::json!({ "location": location }),
    }])
}

// =============================================================================
// Tests
// =============================================================================
