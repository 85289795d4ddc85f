use advisor_core::AdvisorError;
use thiserror::Error;

/// Errors produced by a weather lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Location must not be empty")]
    EmptyLocation,

    #[error("Weather API key is not configured")]
    MissingApiKey,

    /// The provider answered with a non-success status.
    #[error("{message} (status {status})")]
    Provider { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected provider payload: {0}")]
    Decode(String),
}

impl LookupError {
    /// Whether the failure was caused by the caller's input rather than the
    /// provider or the network.
    pub fn is_client_error(&self) -> bool {
        match self {
            LookupError::EmptyLocation => true,
            LookupError::Provider { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

impl From<LookupError> for AdvisorError {
    fn from(err: LookupError) -> Self {
        AdvisorError::Weather(err.to_string())
    }
}
