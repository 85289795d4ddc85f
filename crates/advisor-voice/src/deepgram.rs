//! Deepgram pre-recorded transcription client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use advisor_core::config::TranscriptionConfig;

use crate::error::TranscriptionError;
use crate::{content_type_for, TranscriptionService};

/// Client for Deepgram's `/listen` endpoint.
pub struct DeepgramClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepgramClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TranscriptionService for DeepgramClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        format: Option<&str>,
    ) -> Result<Option<String>, TranscriptionError> {
        if audio.is_empty() {
            tracing::debug!("Empty audio payload, skipping transcription");
            return Ok(None);
        }
        if self.api_key.is_empty() {
            return Err(TranscriptionError::MissingApiKey);
        }

        let content_type = content_type_for(format);
        tracing::debug!(
            bytes = audio.len(),
            content_type = content_type,
            model = %self.model,
            "Sending audio to Deepgram"
        );

        let response = self
            .client
            .post(format!("{}/listen", self.base_url))
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(CONTENT_TYPE, content_type)
            .query(&[
                ("model", self.model.as_str()),
                ("detect_language", "true"),
                ("smart_format", "true"),
                ("punctuate", "true"),
            ])
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Deepgram rejected transcription");
            return Err(map_http_error(status.as_u16(), &body));
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| TranscriptionError::Decode(e.to_string()))?;
        let transcript = extract_transcript(&payload)?;

        tracing::info!(
            chars = transcript.as_ref().map(|t| t.chars().count()).unwrap_or(0),
            "Transcription complete"
        );
        Ok(transcript)
    }
}

/// Deepgram reports undecodable or unsupported audio as 400/415 with an
/// `err_msg`; everything else is a provider failure.
fn map_http_error(status: u16, body: &str) -> TranscriptionError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("err_msg").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status {
        400 | 415 => TranscriptionError::InvalidAudio(message),
        _ => TranscriptionError::Provider { status, message },
    }
}

/// Pull the first alternative's transcript. An empty transcript means no speech.
pub fn extract_transcript(
    payload: &serde_json::Value,
) -> Result<Option<String>, TranscriptionError> {
    let text = payload
        .pointer("/results/channels/0/alternatives/0/transcript")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TranscriptionError::Decode("missing transcript".to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use axum::body::Bytes;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    fn deepgram_reply(transcript: &str) -> serde_json::Value {
        serde_json::json!({
            "results": {"channels": [{"alternatives": [{"transcript": transcript, "confidence": 0.98}]}]}
        })
    }

    async fn spawn_provider() -> String {
        let app = Router::new().route(
            "/listen",
            post(
                |headers: HeaderMap,
                 Query(params): Query<HashMap<String, String>>,
                 body: Bytes| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if auth != "Token dg-key" {
                        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"err_msg": "bad key"})));
                    }
                    if params.get("model").map(String::as_str) != Some("nova-3")
                        || params.get("detect_language").map(String::as_str) != Some("true")
                    {
                        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"err_msg": "bad params"})));
                    }
                    if body.as_ref() == b"garbage" {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({
                                "err_code": "Bad Request",
                                "err_msg": "failed to process audio: corrupt or unsupported data"
                            })),
                        );
                    }
                    if body.as_ref() == b"silence" {
                        return (StatusCode::OK, Json(deepgram_reply("")));
                    }
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    (StatusCode::OK, Json(deepgram_reply(&format!("heard {content_type}"))))
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str, key: &str) -> DeepgramClient {
        let config = TranscriptionConfig {
            api_key: key.to_string(),
            base_url: base_url.to_string(),
            ..TranscriptionConfig::default()
        };
        DeepgramClient::new(&config).unwrap()
    }

    #[test]
    fn test_extract_transcript() {
        let text = extract_transcript(&deepgram_reply("Hello there.")).unwrap();
        assert_eq!(text.as_deref(), Some("Hello there."));
        assert!(extract_transcript(&deepgram_reply("  ")).unwrap().is_none());
        assert!(extract_transcript(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn test_transcribe_sends_content_type() {
        let base = spawn_provider().await;
        let client = client_for(&base, "dg-key");
        let text = client.transcribe(b"RIFF....", Some("mp3")).await.unwrap();
        assert_eq!(text.as_deref(), Some("heard audio/mpeg"));
    }

    #[tokio::test]
    async fn test_transcribe_no_speech() {
        let base = spawn_provider().await;
        let client = client_for(&base, "dg-key");
        let text = client.transcribe(b"silence", None).await.unwrap();
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn test_transcribe_provider_error() {
        let base = spawn_provider().await;
        let client = client_for(&base, "wrong");
        let err = client.transcribe(b"audio", None).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Provider { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_audio_is_invalid_audio() {
        let base = spawn_provider().await;
        let client = client_for(&base, "dg-key");
        let err = client.transcribe(b"garbage", Some("ogg")).await.unwrap_err();
        match err {
            TranscriptionError::InvalidAudio(ref msg) => {
                assert_eq!(msg, "failed to process audio: corrupt or unsupported data")
            }
            ref other => panic!("expected invalid audio, got {other:?}"),
        }
        assert!(err.is_client_error());
    }

    #[test]
    fn test_map_http_error() {
        assert!(matches!(
            map_http_error(415, "unsupported"),
            TranscriptionError::InvalidAudio(ref m) if m == "unsupported"
        ));
        assert!(matches!(
            map_http_error(502, r#"{"err_msg":"upstream"}"#),
            TranscriptionError::Provider { status: 502, ref message } if message == "upstream"
        ));
    }

    #[tokio::test]
    async fn test_zero_length_audio_skips_provider() {
        let client = client_for("http://127.0.0.1:9", "");
        let text = client.transcribe(&[], Some("wav")).await.unwrap();
        assert!(text.is_none());
    }
}
