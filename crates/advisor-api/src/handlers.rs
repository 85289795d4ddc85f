//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body data via axum extractors,
//! calls into AppState services, and returns JSON responses.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use advisor_chat::{ChatMessage, ConversationSession};
use advisor_core::i18n;
use advisor_core::Language;
use advisor_voice::format_from_filename;
use advisor_weather::FormattedWeather;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    pub location: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Unknown ids are created on first use; a missing id starts a new session.
    #[serde(default)]
    pub session_id: Option<String>,
    pub query: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionParams {
    pub language: Option<String>,
    pub session_id: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub session_id: String,
    pub suggestion: String,
    pub chat_history: Vec<ChatMessage>,
    /// Present only when the turn fetched weather.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<FormattedWeather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_updated: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeededSessionResponse {
    pub session_id: String,
    pub weather: FormattedWeather,
    pub suggestion: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExamplesResponse {
    pub examples: Vec<String>,
}

fn language_or_default(tag: Option<&str>) -> Language {
    tag.map(Language::from_tag_or_default).unwrap_or_default()
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - liveness.
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Weather Activity Advisor API".to_string(),
        status: "running".to_string(),
    })
}

/// GET /api/translations/{lang}
pub async fn translations(
    Path(lang): Path<String>,
) -> Result<Json<BTreeMap<&'static str, &'static str>>, ApiError> {
    let language = Language::from_tag(&lang)
        .ok_or_else(|| ApiError::BadRequest("Language not supported".to_string()))?;
    Ok(Json(i18n::translations(language)))
}

/// GET /api/examples/{lang} - any language other than Japanese gets English.
pub async fn examples(Path(lang): Path<String>) -> Json<ExamplesResponse> {
    let language = Language::from_tag_or_default(&lang);
    Json(ExamplesResponse {
        examples: i18n::example_prompts(language)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}

/// POST /api/weather
pub async fn weather(
    State(state): State<AppState>,
    Json(body): Json<WeatherRequest>,
) -> Result<Json<FormattedWeather>, ApiError> {
    let snapshot = state.weather.current(&body.location).await?;
    Ok(Json(FormattedWeather::from(&snapshot)))
}

/// POST /api/suggestions - one chat turn.
pub async fn suggestions(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let language = language_or_default(body.language.as_deref());
    let reply = state
        .orchestrator
        .handle_message(body.session_id.as_deref(), &body.query, language)
        .await?;

    let (weather, weather_updated) = match (&reply.weather, reply.weather_updated) {
        (Some(snapshot), true) => (Some(FormattedWeather::from(snapshot)), Some(true)),
        _ => (None, None),
    };

    Ok(Json(SuggestionResponse {
        session_id: reply.session_id,
        suggestion: reply.answer,
        chat_history: reply.history,
        weather,
        weather_updated,
    }))
}

/// POST /api/weather-with-suggestions
///
/// `language` and `session_id` may come from the query string or the body;
/// the body wins.
pub async fn weather_with_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
    Json(body): Json<WeatherRequest>,
) -> Result<Json<SeededSessionResponse>, ApiError> {
    let language = language_or_default(body.language.as_deref().or(params.language.as_deref()));
    let session_id = body.session_id.or(params.session_id);

    let seeded = state
        .orchestrator
        .seed_with_weather(session_id.as_deref(), &body.location, language)
        .await?;

    Ok(Json(SeededSessionResponse {
        session_id: seeded.session_id,
        weather: FormattedWeather::from(&seeded.weather),
        suggestion: seeded.suggestion,
    }))
}

/// POST /api/session/create
pub async fn create_session(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Result<Json<SessionCreatedResponse>, ApiError> {
    let language = language_or_default(params.language.as_deref());
    let session = state.orchestrator.create_session(language)?;
    Ok(Json(SessionCreatedResponse {
        session_id: session.id,
        message: "Session created successfully. You can start chatting!".to_string(),
    }))
}

/// GET /api/session/{id} - raw session dump.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationSession>, ApiError> {
    Ok(Json(state.orchestrator.get_session(&id)?))
}

/// DELETE /api/session/{id}/chat
pub async fn clear_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.clear_history(&id)?;
    Ok(Json(MessageResponse {
        message: "Chat history cleared".to_string(),
    }))
}

/// POST /api/transcribe - multipart upload with a `file` part.
///
/// The upload's filename extension is the declared audio format.
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, Option<String>)> = None;
    let mut language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let format = field.file_name().and_then(format_from_filename);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read audio: {e}")))?;
                audio = Some((bytes.to_vec(), format));
            }
            Some("language") => {
                language = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (bytes, format) =
        audio.ok_or_else(|| ApiError::BadRequest("Missing audio file".to_string()))?;

    tracing::debug!(
        bytes = bytes.len(),
        format = format.as_deref().unwrap_or("unknown"),
        language = language.as_deref().unwrap_or("en"),
        "Transcription requested"
    );

    let transcript = state
        .transcriber
        .transcribe(&bytes, format.as_deref())
        .await?;

    Ok(Json(match transcript {
        Some(text) => TranscribeResponse {
            transcript: Some(text),
            success: true,
            message: None,
        },
        None => TranscribeResponse {
            transcript: None,
            success: false,
            message: Some("No speech detected".to_string()),
        },
    }))
}
