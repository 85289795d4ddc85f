use thiserror::Error;

/// Top-level error type for the advisor.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define their
/// own error types and implement `From<SubsystemError> for AdvisorError` so
/// that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Weather lookup error: {0}")]
    Weather(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AdvisorError {
    fn from(err: toml::de::Error) -> Self {
        AdvisorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AdvisorError {
    fn from(err: toml::ser::Error) -> Self {
        AdvisorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for advisor operations.
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdvisorError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(AdvisorError, &str)> = vec![
            (
                AdvisorError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                AdvisorError::Weather("no matching location".to_string()),
                "Weather lookup error: no matching location",
            ),
            (
                AdvisorError::Transcription("provider down".to_string()),
                "Transcription error: provider down",
            ),
            (
                AdvisorError::Completion("rate limited".to_string()),
                "Completion error: rate limited",
            ),
            (
                AdvisorError::Session("not found".to_string()),
                "Session error: not found",
            ),
            (
                AdvisorError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                AdvisorError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: AdvisorError = io_err.into();
        assert!(matches!(err, AdvisorError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let advisor_err: AdvisorError = err.unwrap_err().into();
        assert!(matches!(advisor_err, AdvisorError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ invalid }");
        let advisor_err: AdvisorError = err.unwrap_err().into();
        assert!(matches!(advisor_err, AdvisorError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
