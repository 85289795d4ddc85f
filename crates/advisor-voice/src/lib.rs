//! Advisor voice crate - speech-to-text for spoken queries.
//!
//! Provides a trait-based abstraction for transcription, the Deepgram
//! client, audio format to content-type mapping, and a mock implementation
//! for testing without a provider.

pub mod deepgram;
pub mod error;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

pub use deepgram::DeepgramClient;
pub use error::TranscriptionError;

/// Content type used when the format is missing or unrecognized.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/wav";

/// Map a declared audio format (usually a file extension) to a content type.
pub fn content_type_for(format: Option<&str>) -> &'static str {
    let Some(format) = format else {
        return DEFAULT_CONTENT_TYPE;
    };
    match format.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Extract the declared format from an upload filename ("clip.MP3" -> "mp3").
pub fn format_from_filename(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Service for turning recorded audio into text.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe `audio` in the declared `format`.
    ///
    /// Returns `Ok(None)` when no speech was detected. A zero-length payload
    /// is reported as no speech without contacting the provider.
    async fn transcribe(
        &self,
        audio: &[u8],
        format: Option<&str>,
    ) -> Result<Option<String>, TranscriptionError>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock transcription service that returns a fixed transcript.
///
/// Used for testing and development without a Deepgram key.
#[derive(Debug, Default)]
pub struct MockTranscriptionService {
    transcript: Option<String>,
    calls: AtomicUsize,
}

impl MockTranscriptionService {
    pub fn new() -> Self {
        Self::with_transcript("[mock transcription]")
    }

    pub fn with_transcript(text: &str) -> Self {
        Self {
            transcript: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock that never hears speech.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Number of provider round-trips the mock would have made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(
        &self,
        audio: &[u8],
        format: Option<&str>,
    ) -> Result<Option<String>, TranscriptionError> {
        if audio.is_empty() {
            return Ok(None);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            bytes = audio.len(),
            content_type = content_type_for(format),
            "Mock transcription generated"
        );
        Ok(self.transcript.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for(Some("mp3")), "audio/mpeg");
        assert_eq!(content_type_for(Some("M4A")), "audio/mp4");
        assert_eq!(content_type_for(Some("webm")), "audio/webm");
        assert_eq!(content_type_for(Some("opus")), "audio/opus");
        assert_eq!(content_type_for(Some(".flac")), "audio/flac");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for(None), "audio/wav");
        assert_eq!(content_type_for(Some("aiff")), "audio/wav");
        assert_eq!(content_type_for(Some("")), "audio/wav");
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(format_from_filename("clip.MP3").as_deref(), Some("mp3"));
        assert_eq!(format_from_filename("a.b.ogg").as_deref(), Some("ogg"));
        assert_eq!(format_from_filename("noext"), None);
        assert_eq!(format_from_filename("trailing."), None);
    }

    #[tokio::test]
    async fn test_mock_transcription_basic() {
        let service = MockTranscriptionService::with_transcript("what should I wear");
        let text = service.transcribe(&[1, 2, 3], Some("wav")).await.unwrap();
        assert_eq!(text.as_deref(), Some("what should I wear"));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_transcription_empty_audio_is_no_speech() {
        let service = MockTranscriptionService::new();
        let text = service.transcribe(&[], None).await.unwrap();
        assert!(text.is_none());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_silent() {
        let service = MockTranscriptionService::silent();
        assert!(service.transcribe(&[0; 64], None).await.unwrap().is_none());
    }
}
