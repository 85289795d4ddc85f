//! Session storage.

use std::collections::HashMap;
use std::sync::Mutex;

use advisor_core::Language;

use crate::error::ChatError;
use crate::types::ConversationSession;

/// Keyed store of conversation sessions.
///
/// Writes are whole-session replacements, so concurrent turns on the same
/// session resolve as last-writer-wins.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<ConversationSession>, ChatError>;

    /// Create a fresh session. An existing session with the same id is
    /// replaced.
    fn create(&self, id: Option<String>, language: Language)
        -> Result<ConversationSession, ChatError>;

    /// Store `session` under its id.
    fn save(&self, session: ConversationSession) -> Result<(), ChatError>;

    /// Empty a session's message history, keeping its weather and language.
    fn clear_history(&self, id: &str) -> Result<(), ChatError>;

    fn len(&self) -> Result<usize, ChatError>;

    fn is_empty(&self) -> Result<bool, ChatError> {
        Ok(self.len()? == 0)
    }

    /// Fetch `id`, creating it with `language` when unknown.
    fn get_or_create(&self, id: &str, language: Language) -> Result<ConversationSession, ChatError> {
        match self.get(id)? {
            Some(session) => Ok(session),
            None => {
                tracing::info!(session_id = %id, "Creating session on first use");
                self.create(Some(id.to_string()), language)
            }
        }
    }
}

/// Process-memory session store. No eviction.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, ConversationSession>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> Result<Option<ConversationSession>, ChatError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn create(
        &self,
        id: Option<String>,
        language: Language,
    ) -> Result<ConversationSession, ChatError> {
        let session = ConversationSession::new(id, language);
        let replaced = self
            .lock()?
            .insert(session.id.clone(), session.clone())
            .is_some();
        tracing::debug!(session_id = %session.id, language = %language, replaced, "Session created");
        Ok(session)
    }

    fn save(&self, session: ConversationSession) -> Result<(), ChatError> {
        self.lock()?.insert(session.id.clone(), session);
        Ok(())
    }

    fn clear_history(&self, id: &str) -> Result<(), ChatError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        session.messages.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, ChatError> {
        Ok(self.lock()?.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
