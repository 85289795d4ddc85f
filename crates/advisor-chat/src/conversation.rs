//! The tool-calling conversation loop.
//!
//! One call to [`ConversationLoop::run`] produces one answer for one user
//! turn. Each turn moves through these states:
//!
//! AwaitModel -> ExecuteTool -> AwaitModel (tools withdrawn) -> ... -> Done
//! AwaitModel -> FallbackExtract -> AwaitModel (single shot) -> Done
//! AwaitModel -> Failed once the round ceiling is hit
//!
//! The weather capability runs in at most one round per turn. After it has
//! run, the model is re-asked with tools withdrawn until it answers in text.

use std::sync::Arc;

use advisor_core::config::ChatConfig;
use advisor_core::{Language, WeatherSnapshot};
use advisor_weather::{weather_summary, WeatherLookup};

use crate::completion::{CompletionError, CompletionService};
use crate::location::LocationExtractor;
use crate::prompt;
use crate::types::{ChatMessage, ModelResponse, ToolInvocation, WEATHER_TOOL};

/// Answer returned when the round ceiling is exhausted.
pub const ITERATION_LIMIT_MESSAGE: &str =
    "Error: Maximum iterations reached while processing your request.";

/// Inputs for one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// The user's message. `None` asks for an unprompted initial suggestion.
    pub query: Option<&'a str>,
    /// Prior history, oldest first. Only the trailing window is sent.
    pub history: &'a [ChatMessage],
    /// Last-known weather for the session.
    pub weather: Option<&'a WeatherSnapshot>,
    pub language: Language,
    /// Whether the weather capability may be offered this turn.
    pub tools_enabled: bool,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model produced a final answer.
    Done,
    /// The completion service failed; the answer carries the error text.
    Degraded,
    /// The round ceiling was exhausted.
    Failed,
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub status: TurnStatus,
    /// Completion calls made, including the tool-disabling retry.
    pub model_calls: usize,
    /// Weather in effect at the end of the turn (old or newly fetched).
    pub weather: Option<WeatherSnapshot>,
    /// True when a lookup succeeded during this turn.
    pub weather_updated: bool,
}

enum TurnState {
    AwaitModel,
    ExecuteTool(Vec<ToolInvocation>),
    FallbackExtract(String),
    Done(String),
    Degraded(String),
    Failed,
}

/// Mutable bookkeeping for a turn in flight.
struct Turn {
    messages: Vec<ChatMessage>,
    tools_enabled: bool,
    tool_executed: bool,
    weather: Option<WeatherSnapshot>,
    weather_updated: bool,
    rounds: usize,
    model_calls: usize,
}

impl Turn {
    fn record_weather(&mut self, snapshot: WeatherSnapshot) {
        self.weather = Some(snapshot);
        self.weather_updated = true;
    }

    fn finish(self, answer: String, status: TurnStatus) -> TurnOutcome {
        TurnOutcome {
            answer,
            status,
            model_calls: self.model_calls,
            weather: self.weather,
            weather_updated: self.weather_updated,
        }
    }
}

/// Drives the model, the weather capability, and the extraction fallback.
pub struct ConversationLoop {
    completion: Arc<dyn CompletionService>,
    weather: Arc<dyn WeatherLookup>,
    extractor: Arc<dyn LocationExtractor>,
    max_iterations: usize,
    history_window: usize,
}

impl ConversationLoop {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        weather: Arc<dyn WeatherLookup>,
        extractor: Arc<dyn LocationExtractor>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            completion,
            weather,
            extractor,
            max_iterations: config.max_iterations.max(1),
            history_window: config.history_window,
        }
    }

    /// Run one turn to completion. Never fails: provider errors become a
    /// degraded answer.
    pub async fn run(&self, request: TurnRequest<'_>) -> TurnOutcome {
        let mut turn = Turn {
            messages: self.initial_context(&request),
            tools_enabled: request.tools_enabled,
            tool_executed: false,
            weather: request.weather.cloned(),
            weather_updated: false,
            rounds: 0,
            model_calls: 0,
        };

        let mut state = TurnState::AwaitModel;
        loop {
            state = match state {
                TurnState::AwaitModel => self.await_model(&mut turn).await,
                TurnState::ExecuteTool(calls) => self.execute_tools(&mut turn, calls).await,
                TurnState::FallbackExtract(answer) => {
                    self.fallback_extract(&mut turn, &request, answer).await
                }
                TurnState::Done(answer) => return self.finish(turn, answer, TurnStatus::Done),
                TurnState::Degraded(answer) => {
                    return self.finish(turn, answer, TurnStatus::Degraded)
                }
                TurnState::Failed => {
                    return self.finish(
                        turn,
                        ITERATION_LIMIT_MESSAGE.to_string(),
                        TurnStatus::Failed,
                    )
                }
            };
        }
    }

    /// System prompt, trailing history window, then the current request.
    fn initial_context(&self, request: &TurnRequest<'_>) -> Vec<ChatMessage> {
        let window_start = request.history.len().saturating_sub(self.history_window);
        let mut messages = Vec::with_capacity(self.history_window + 2);
        messages.push(ChatMessage::system(prompt::system_prompt(
            request.language,
            request.weather,
        )));
        messages.extend(request.history[window_start..].iter().cloned());
        let current = request
            .query
            .unwrap_or_else(|| prompt::initial_request(request.language));
        messages.push(ChatMessage::user(current));
        messages
    }

    async fn await_model(&self, turn: &mut Turn) -> TurnState {
        if turn.rounds >= self.max_iterations {
            tracing::warn!(rounds = turn.rounds, "Round ceiling reached without an answer");
            return TurnState::Failed;
        }
        turn.rounds += 1;

        let offer_tools = turn.tools_enabled && !turn.tool_executed;
        let response = match self.call_model(turn, offer_tools).await {
            Err(err) if offer_tools && err.is_tool_related() => {
                tracing::warn!(error = %err, "Tool-related completion error, retrying without tools");
                turn.tools_enabled = false;
                self.call_model(turn, false).await
            }
            other => other,
        };
        let tools_offered = turn.tools_enabled && !turn.tool_executed;

        match response {
            Err(err) => {
                tracing::warn!(error = %err, "Completion failed, returning degraded answer");
                TurnState::Degraded(format!("Error getting AI suggestions: {err}"))
            }
            Ok(ModelResponse::ToolRequest(calls)) if tools_offered => {
                turn.messages.push(ChatMessage::Assistant {
                    content: String::new(),
                    tool_calls: calls.clone(),
                });
                TurnState::ExecuteTool(calls)
            }
            Ok(ModelResponse::ToolRequest(calls)) => {
                // Tools are withdrawn; a request is not an answer.
                tracing::debug!(requested = calls.len(), "Ignoring tool request after tools were withdrawn");
                TurnState::AwaitModel
            }
            Ok(ModelResponse::Text(answer)) => TurnState::FallbackExtract(answer),
        }
    }

    async fn call_model(
        &self,
        turn: &mut Turn,
        tools_enabled: bool,
    ) -> Result<ModelResponse, CompletionError> {
        turn.model_calls += 1;
        self.completion.complete(&turn.messages, tools_enabled).await
    }

    async fn execute_tools(&self, turn: &mut Turn, calls: Vec<ToolInvocation>) -> TurnState {
        for call in calls {
            let content = if call.name == WEATHER_TOOL {
                let location = call.location().unwrap_or_default();
                match self.weather.current(location).await {
                    Ok(snapshot) => {
                        tracing::info!(location = %snapshot.location, "Weather tool executed");
                        let summary = weather_summary(&snapshot);
                        turn.record_weather(snapshot);
                        summary
                    }
                    Err(err) => {
                        tracing::warn!(location = %location, error = %err, "Weather tool failed");
                        prompt::lookup_failure(location, &err)
                    }
                }
            } else {
                tracing::warn!(tool = %call.name, "Model requested an unknown tool");
                format!("Unknown tool: {}", call.name)
            };

            turn.messages.push(ChatMessage::Tool {
                tool_call_id: call.id,
                name: call.name,
                content,
            });
        }

        turn.tool_executed = true;
        TurnState::AwaitModel
    }

    /// Reached with the model's text answer. Only the first round of a turn
    /// that had no weather and made no tool call is eligible.
    async fn fallback_extract(
        &self,
        turn: &mut Turn,
        request: &TurnRequest<'_>,
        answer: String,
    ) -> TurnState {
        let eligible = turn.rounds == 1 && !turn.tool_executed && request.weather.is_none();
        let Some(query) = request.query.filter(|_| eligible) else {
            return TurnState::Done(answer);
        };
        let Some(location) = self.extractor.extract(query, request.language) else {
            return TurnState::Done(answer);
        };

        match self.weather.current(&location).await {
            Ok(snapshot) => {
                tracing::info!(location = %snapshot.location, "Weather fetched from extracted location");
                turn.messages = vec![
                    ChatMessage::system(prompt::base_system_prompt(request.language)),
                    ChatMessage::user(prompt::weather_grounded_prompt(
                        request.language,
                        &snapshot,
                        query,
                    )),
                ];
                turn.record_weather(snapshot);
                turn.tool_executed = true;
                TurnState::AwaitModel
            }
            Err(err) => {
                tracing::debug!(location = %location, error = %err, "Extracted location lookup failed");
                TurnState::Done(answer)
            }
        }
    }

    fn finish(&self, turn: Turn, answer: String, status: TurnStatus) -> TurnOutcome {
        tracing::info!(
            status = ?status,
            model_calls = turn.model_calls,
            weather_updated = turn.weather_updated,
            "Turn finished"
        );
        turn.finish(answer, status)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use advisor_weather::{synthetic_snapshot, MockWeatherLookup};

    use crate::completion::{weather_request, MockCompletionService};
    use crate::location::PatternLocationExtractor;

    fn weather() -> Arc<MockWeatherLookup> {
        Arc::new(
            MockWeatherLookup::new()
                .with_location("Tokyo", "Japan")
                .with_location("Paris", "France"),
        )
    }

    fn make_loop(
        completion: Arc<MockCompletionService>,
        weather: Arc<MockWeatherLookup>,
    ) -> ConversationLoop {
        ConversationLoop::new(
            completion,
            weather,
            Arc::new(PatternLocationExtractor::new()),
            &ChatConfig::default(),
        )
    }

    fn request<'a>(query: Option<&'a str>, history: &'a [ChatMessage]) -> TurnRequest<'a> {
        TurnRequest {
            query,
            history,
            weather: None,
            language: Language::En,
            tools_enabled: true,
        }
    }

    // ---- Ceiling ----

    #[tokio::test]
    async fn test_always_tool_model_hits_ceiling() {
        let completion = Arc::new(MockCompletionService::repeating(weather_request("Tokyo")));
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp.run(request(Some("weather in Tokyo?"), &[])).await;

        assert_eq!(out.status, TurnStatus::Failed);
        assert_eq!(out.answer, ITERATION_LIMIT_MESSAGE);
        assert_eq!(completion.call_count(), 5);
        assert_eq!(out.model_calls, 5);
        // The tool ran once; later requests were ignored.
        assert_eq!(lookup.call_count(), 1);
        assert!(out.weather_updated);
    }

    #[tokio::test]
    async fn test_repeat_tool_request_is_reasked_then_answers() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then(weather_request("Tokyo"))
                .then(weather_request("Tokyo"))
                .then(ModelResponse::Text("Shorts and sunscreen.".into())),
        );
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp.run(request(Some("weather in Tokyo?"), &[])).await;

        assert_eq!(out.status, TurnStatus::Done);
        assert_eq!(out.answer, "Shorts and sunscreen.");
        assert_eq!(out.model_calls, 3);
        assert_eq!(completion.call_count(), 3);
        assert_eq!(lookup.call_count(), 1);

        let calls = completion.calls();
        assert!(calls[0].tools_enabled);
        assert!(!calls[1].tools_enabled);
        assert!(!calls[2].tools_enabled);
        // The ignored request adds nothing to the context.
        assert_eq!(calls[1].messages.len(), calls[2].messages.len());
    }

    // ---- Tool path ----

    #[tokio::test]
    async fn test_single_tool_call_then_answer() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then(weather_request("Tokyo"))
                .then(ModelResponse::Text("Bring a light jacket.".into())),
        );
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp
            .run(request(Some("What should I wear in Tokyo today?"), &[]))
            .await;

        assert_eq!(out.status, TurnStatus::Done);
        assert_eq!(out.answer, "Bring a light jacket.");
        assert_eq!(out.weather.as_ref().unwrap().location, "Tokyo");
        assert!(out.weather_updated);
        assert_eq!(lookup.call_count(), 1);

        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].tools_enabled);
        assert!(!calls[1].tools_enabled);

        let second = &calls[1].messages;
        assert!(matches!(second[second.len() - 2], ChatMessage::Assistant { ref tool_calls, .. } if tool_calls.len() == 1));
        match second.last().unwrap() {
            ChatMessage::Tool { tool_call_id, name, content } => {
                assert_eq!(tool_call_id, "call_tokyo");
                assert_eq!(name, WEATHER_TOOL);
                assert!(content.starts_with("Weather in Tokyo, Japan:"));
            }
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_lookup_failure_is_reported_to_model() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then(weather_request("Atlantis"))
                .then(ModelResponse::Text("I couldn't find that place.".into())),
        );
        let lp = make_loop(completion.clone(), weather());

        let out = lp.run(request(Some("weather in Atlantis?"), &[])).await;

        assert_eq!(out.status, TurnStatus::Done);
        assert!(out.weather.is_none());
        assert!(!out.weather_updated);
        let tool_msg = completion.calls()[1].messages.last().unwrap().clone();
        assert!(tool_msg
            .content()
            .starts_with("Error fetching weather for Atlantis:"));
    }

    // ---- Fallback extraction ----

    #[tokio::test]
    async fn test_fallback_extracts_location_when_model_skips_tool() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then(ModelResponse::Text("Where are you?".into()))
                .then(ModelResponse::Text("It's sunny in Tokyo, wear a t-shirt.".into())),
        );
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp
            .run(request(Some("What should I wear in Tokyo today?"), &[]))
            .await;

        assert_eq!(out.status, TurnStatus::Done);
        assert_eq!(out.answer, "It's sunny in Tokyo, wear a t-shirt.");
        assert_eq!(out.weather.as_ref().unwrap().location, "Tokyo");
        assert!(out.weather_updated);
        assert_eq!(lookup.requested(), vec!["Tokyo"]);

        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[1].tools_enabled);
        assert_eq!(calls[1].messages.len(), 2);
        assert!(calls[1].messages[1]
            .content()
            .starts_with("Weather in Tokyo, Japan:"));
        assert!(calls[1].messages[1]
            .content()
            .contains("User query: What should I wear in Tokyo today?"));
    }

    #[tokio::test]
    async fn test_no_fallback_when_session_has_weather() {
        let completion = Arc::new(MockCompletionService::answering("Layers are fine."));
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());
        let known = synthetic_snapshot("Paris", "France");

        let out = lp
            .run(TurnRequest {
                weather: Some(&known),
                ..request(Some("What about in Tokyo today?"), &[])
            })
            .await;

        assert_eq!(out.answer, "Layers are fine.");
        assert_eq!(lookup.call_count(), 0);
        assert_eq!(out.weather.unwrap().location, "Paris");
        assert!(!out.weather_updated);
    }

    #[tokio::test]
    async fn test_fallback_lookup_failure_keeps_first_answer() {
        let completion = Arc::new(MockCompletionService::answering("Hello!"));
        let lookup = Arc::new(MockWeatherLookup::new());
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp.run(request(Some("Anything fun in Gotham?"), &[])).await;

        assert_eq!(out.status, TurnStatus::Done);
        assert_eq!(out.answer, "Hello!");
        assert_eq!(lookup.requested(), vec!["Gotham"]);
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn test_greeting_makes_one_call() {
        let completion = Arc::new(MockCompletionService::answering("Hi! How can I help?"));
        let lookup = weather();
        let lp = make_loop(completion.clone(), lookup.clone());

        let out = lp.run(request(Some("hi"), &[])).await;

        assert_eq!(out.answer, "Hi! How can I help?");
        assert_eq!(out.model_calls, 1);
        assert_eq!(lookup.call_count(), 0);
    }

    // ---- Errors ----

    #[tokio::test]
    async fn test_tool_related_error_retries_without_tools() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then_fail(CompletionError::Provider {
                    status: 400,
                    message: "tool_use_failed".into(),
                })
                .then(ModelResponse::Text("Plain answer".into())),
        );
        let lp = make_loop(completion.clone(), weather());

        let out = lp.run(request(Some("hello"), &[])).await;

        assert_eq!(out.status, TurnStatus::Done);
        assert_eq!(out.answer, "Plain answer");
        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].tools_enabled);
        assert!(!calls[1].tools_enabled);
    }

    #[tokio::test]
    async fn test_other_errors_become_degraded_answer() {
        let completion = Arc::new(MockCompletionService::new().then_fail(
            CompletionError::Provider {
                status: 429,
                message: "Rate limit reached".into(),
            },
        ));
        let lp = make_loop(completion.clone(), weather());

        let out = lp.run(request(Some("hello"), &[])).await;

        assert_eq!(out.status, TurnStatus::Degraded);
        assert!(out.answer.starts_with("Error getting AI suggestions: "));
        assert!(out.answer.contains("Rate limit reached"));
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_retry_is_degraded() {
        let completion = Arc::new(
            MockCompletionService::new()
                .then_fail(CompletionError::Provider {
                    status: 400,
                    message: "Failed to call a function".into(),
                })
                .then_fail(CompletionError::Transport("connection reset".into())),
        );
        let lp = make_loop(completion.clone(), weather());

        let out = lp.run(request(Some("hello"), &[])).await;

        assert_eq!(out.status, TurnStatus::Degraded);
        assert_eq!(out.model_calls, 2);
    }

    // ---- Context construction ----

    #[tokio::test]
    async fn test_initial_suggestion_turn() {
        let completion = Arc::new(MockCompletionService::answering("Go for a walk."));
        let lp = make_loop(completion.clone(), weather());
        let known = synthetic_snapshot("Tokyo", "Japan");

        let out = lp
            .run(TurnRequest {
                query: None,
                history: &[],
                weather: Some(&known),
                language: Language::Ja,
                tools_enabled: false,
            })
            .await;

        assert_eq!(out.answer, "Go for a walk.");
        let call = &completion.calls()[0];
        assert!(!call.tools_enabled);
        assert!(call.messages[0]
            .content()
            .contains("[Available weather data for Tokyo, Japan:"));
        assert_eq!(
            call.messages[1].content(),
            prompt::initial_request(Language::Ja)
        );
    }

    #[tokio::test]
    async fn test_history_window_is_trailing_ten() {
        let completion = Arc::new(MockCompletionService::answering("ok"));
        let lp = make_loop(completion.clone(), weather());
        let history: Vec<ChatMessage> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{i}"))
                } else {
                    ChatMessage::assistant(format!("a{i}"))
                }
            })
            .collect();

        lp.run(request(Some("next"), &history)).await;

        let messages = &completion.calls()[0].messages;
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[1].content(), "q2");
        assert_eq!(messages[10].content(), "a11");
        assert_eq!(messages[11].content(), "next");
    }
}
