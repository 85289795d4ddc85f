//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, and all endpoint
//! handlers. Everything except the liveness route lives under `/api`.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use advisor_core::{AdvisorConfig, AdvisorError};

use crate::handlers;
use crate::state::AppState;

/// Upload ceiling for audio sent to `/api/transcribe`.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Origins allowed to call the API.
///
/// A `*` entry allows every origin. Credentials are allowed, which rules out
/// a literal wildcard header, so the request's own origin is echoed back.
fn allowed_origins(configured: &[String]) -> AllowOrigin {
    if configured.iter().any(|origin| origin.trim() == "*") {
        tracing::info!("CORS wildcard configured, mirroring request origins");
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.server.cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    let api_routes = Router::new()
        .route("/translations/{lang}", get(handlers::translations))
        .route("/examples/{lang}", get(handlers::examples))
        .route("/weather", post(handlers::weather))
        .route("/suggestions", post(handlers::suggestions))
        .route(
            "/weather-with-suggestions",
            post(handlers::weather_with_suggestions),
        )
        .route("/session/create", post(handlers::create_session))
        .route("/session/{id}", get(handlers::get_session))
        .route("/session/{id}/chat", delete(handlers::clear_chat))
        .route(
            "/transcribe",
            post(handlers::transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        );

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn start_server(config: &AdvisorConfig, state: AppState) -> Result<(), AdvisorError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AdvisorError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| AdvisorError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
