//! Chat orchestrator: binds the conversation loop to the session store.
//!
//! Validates incoming messages, resolves sessions, runs a turn, and writes
//! the exchange and any refreshed weather back to the session.

use std::sync::Arc;

use advisor_core::config::ChatConfig;
use advisor_core::{Language, WeatherSnapshot};
use advisor_weather::WeatherLookup;

use crate::completion::CompletionService;
use crate::conversation::{ConversationLoop, TurnRequest, TurnStatus};
use crate::error::ChatError;
use crate::location::LocationExtractor;
use crate::session::SessionStore;
use crate::types::{ChatMessage, ConversationSession};

/// Result of a chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub session_id: String,
    pub answer: String,
    pub status: TurnStatus,
    /// Full session history after the turn.
    pub history: Vec<ChatMessage>,
    /// Weather in effect after the turn.
    pub weather: Option<WeatherSnapshot>,
    /// True when the turn fetched weather.
    pub weather_updated: bool,
}

/// Result of seeding a session with a location's weather.
#[derive(Debug, Clone)]
pub struct SeededSession {
    pub session_id: String,
    pub weather: WeatherSnapshot,
    /// Initial suggestion for the weather. Not recorded in history.
    pub suggestion: String,
}

/// Central coordinator for chat sessions.
pub struct ChatOrchestrator {
    conversation: ConversationLoop,
    sessions: Arc<dyn SessionStore>,
    weather: Arc<dyn WeatherLookup>,
    max_message_length: usize,
}

impl ChatOrchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        weather: Arc<dyn WeatherLookup>,
        sessions: Arc<dyn SessionStore>,
        extractor: Arc<dyn LocationExtractor>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            conversation: ConversationLoop::new(completion, weather.clone(), extractor, config),
            sessions,
            weather,
            max_message_length: config.max_message_length,
        }
    }

    /// Handle a user message.
    ///
    /// An unknown `session_id` is created on first use with `language`; a
    /// missing one gets a fresh session. The session's own language selects
    /// the prompts.
    pub async fn handle_message(
        &self,
        session_id: Option<&str>,
        message: &str,
        language: Language,
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let mut session = match session_id {
            Some(id) => self.sessions.get_or_create(id, language)?,
            None => self.sessions.create(None, language)?,
        };

        let outcome = self
            .conversation
            .run(TurnRequest {
                query: Some(message),
                history: &session.messages,
                weather: session.last_weather.as_ref(),
                language: session.language,
                tools_enabled: true,
            })
            .await;

        session.messages.push(ChatMessage::user(message));
        session
            .messages
            .push(ChatMessage::assistant(outcome.answer.clone()));
        if outcome.weather_updated {
            session.last_weather = outcome.weather.clone();
        }

        tracing::info!(
            session_id = %session.id,
            history_len = session.messages.len(),
            weather_updated = outcome.weather_updated,
            "Chat turn recorded"
        );

        let reply = ChatReply {
            session_id: session.id.clone(),
            answer: outcome.answer,
            status: outcome.status,
            history: session.messages.clone(),
            weather: session.last_weather.clone(),
            weather_updated: outcome.weather_updated,
        };
        self.sessions.save(session)?;
        Ok(reply)
    }

    /// Fetch weather for `location`, (re)initialise the session with it and
    /// an empty history, and produce an initial suggestion with tools
    /// disabled.
    ///
    /// A failed lookup leaves session state untouched.
    pub async fn seed_with_weather(
        &self,
        session_id: Option<&str>,
        location: &str,
        language: Language,
    ) -> Result<SeededSession, ChatError> {
        let snapshot = self.weather.current(location).await?;

        let mut session = self
            .sessions
            .create(session_id.map(str::to_string), language)?;
        session.last_weather = Some(snapshot.clone());
        self.sessions.save(session.clone())?;

        let outcome = self
            .conversation
            .run(TurnRequest {
                query: None,
                history: &[],
                weather: Some(&snapshot),
                language,
                tools_enabled: false,
            })
            .await;

        tracing::info!(session_id = %session.id, location = %snapshot.location, "Session seeded with weather");

        Ok(SeededSession {
            session_id: session.id,
            weather: snapshot,
            suggestion: outcome.answer,
        })
    }

    /// Create an empty session.
    pub fn create_session(&self, language: Language) -> Result<ConversationSession, ChatError> {
        self.sessions.create(None, language)
    }

    pub fn get_session(&self, session_id: &str) -> Result<ConversationSession, ChatError> {
        self.sessions
            .get(session_id)?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    pub fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        self.sessions.clear_history(session_id)?;
        tracing::info!(session_id = %session_id, "Chat history cleared");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
