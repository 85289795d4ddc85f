//! Shared building blocks for the weather activity advisor.
//!
//! Holds the domain types every other crate speaks (languages, weather
//! snapshots), the top-level error, TOML configuration with environment
//! overrides, and the localized UI bundles.

pub mod config;
pub mod error;
pub mod i18n;
pub mod types;

pub use config::AdvisorConfig;
pub use error::{AdvisorError, Result};
pub use types::*;
