//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;

use advisor_chat::ChatOrchestrator;
use advisor_core::AdvisorConfig;
use advisor_voice::TranscriptionService;
use advisor_weather::WeatherLookup;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Session
/// state lives behind the orchestrator's store.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AdvisorConfig>,
    /// Conversation loop plus session store.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Weather provider for direct lookups.
    pub weather: Arc<dyn WeatherLookup>,
    /// Speech-to-text provider.
    pub transcriber: Arc<dyn TranscriptionService>,
}

impl AppState {
    pub fn new(
        config: AdvisorConfig,
        orchestrator: Arc<ChatOrchestrator>,
        weather: Arc<dyn WeatherLookup>,
        transcriber: Arc<dyn TranscriptionService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            weather,
            transcriber,
        }
    }
}
