//! Advisor API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API for the weather advisor: weather lookups, chat
//! turns with the tool-calling loop, session management, transcription,
//! localization bundles, and example prompts.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
