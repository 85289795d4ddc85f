use advisor_core::AdvisorError;
use thiserror::Error;

/// Errors produced by a transcription request.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription API key is not configured")]
    MissingApiKey,

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// The provider answered with a non-success status.
    #[error("Deepgram API error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected provider payload: {0}")]
    Decode(String),
}

impl TranscriptionError {
    /// Whether the caller sent something unusable, as opposed to an
    /// upstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TranscriptionError::InvalidAudio(_))
    }
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TranscriptionError::Decode(err.to_string())
        } else {
            TranscriptionError::Transport(err.to_string())
        }
    }
}

impl From<TranscriptionError> for AdvisorError {
    fn from(err: TranscriptionError) -> Self {
        AdvisorError::Transcription(err.to_string())
    }
}
