//! Error types for the conversation layer.

use advisor_core::AdvisorError;

/// Errors from the chat orchestrator and session store.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("weather error: {0}")]
    Weather(#[from] advisor_weather::LookupError),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ChatError> for AdvisorError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Weather(e) => e.into(),
            other => AdvisorError::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_weather::LookupError;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::SessionNotFound("abc".into()).to_string(),
            "session not found: abc"
        );
        assert_eq!(
            ChatError::StorageError("lock poisoned".into()).to_string(),
            "storage error: lock poisoned"
        );
    }

    #[test]
    fn test_into_advisor_error() {
        let err: AdvisorError = ChatError::SessionNotFound("x".into()).into();
        assert!(matches!(err, AdvisorError::Session(_)));

        let err: AdvisorError = ChatError::Weather(LookupError::EmptyLocation).into();
        assert!(matches!(err, AdvisorError::Weather(_)));
    }
}
