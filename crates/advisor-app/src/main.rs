//! Advisor application binary - composition root.
//!
//! Ties together all advisor crates into a single executable:
//! 1. Load configuration from TOML, then environment, then flags
//! 2. Build the provider clients (weather, completion, transcription)
//! 3. Wire them into the chat orchestrator with an in-memory session store
//! 4. Serve the axum REST API, or run the terminal chat

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;

use advisor_api::AppState;
use advisor_chat::{ChatOrchestrator, CompletionClient, InMemorySessionStore, PatternLocationExtractor};
use advisor_core::AdvisorConfig;
use advisor_voice::{DeepgramClient, TranscriptionService};
use advisor_weather::{WeatherApiClient, WeatherLookup};

use cli::{CliArgs, Command};

/// Provider clients and the orchestrator built on top of them.
struct Services {
    orchestrator: Arc<ChatOrchestrator>,
    weather: Arc<dyn WeatherLookup>,
    transcriber: Arc<dyn TranscriptionService>,
}

fn build_services(config: &AdvisorConfig) -> Result<Services, Box<dyn std::error::Error>> {
    let weather: Arc<dyn WeatherLookup> = Arc::new(WeatherApiClient::new(&config.weather)?);
    let completion = CompletionClient::new(&config.completion)?;
    tracing::info!(model = %completion.model(), "Completion client ready");
    let transcriber: Arc<dyn TranscriptionService> =
        Arc::new(DeepgramClient::new(&config.transcription)?);

    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::new(completion),
        Arc::clone(&weather),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(PatternLocationExtractor::new()),
        &config.chat,
    ));

    Ok(Services {
        orchestrator,
        weather,
        transcriber,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        AdvisorConfig::load_or_default(&config_file)
    } else {
        AdvisorConfig::default()
    };
    config.apply_env_overrides();
    args.apply_to(&mut config);

    // Tracing. RUST_LOG wins over the resolved level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.resolve_log_level(&config))),
        )
        .init();

    tracing::info!("Starting advisor v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    let missing = config.missing_api_keys();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "API keys not configured; the matching features will fail until they are set"
        );
    }

    let services = build_services(&config)?;

    let command = args.command();
    match &command {
        Command::Serve => {
            let state = AppState::new(
                config.clone(),
                services.orchestrator,
                services.weather,
                services.transcriber,
            );
            if let Err(e) = advisor_api::start_server(&config, state).await {
                tracing::error!(error = %e, "API server stopped");
                tracing::error!(
                    "Try: ADVISOR_PORT={} advisor serve",
                    config.server.port.saturating_add(1)
                );
                return Err(e.into());
            }
        }
        Command::Chat { location, .. } => {
            repl::run(
                services.orchestrator,
                services.transcriber,
                command.language(),
                location.clone(),
            )
            .await?;
        }
    }

    Ok(())
}
