//! Weather lookup crate - current conditions for a named location.
//!
//! Provides a trait-based abstraction over the weather provider, the
//! WeatherAPI.com client, display/prompt formatting for snapshots, and a
//! mock implementation for testing without network access.

pub mod client;
pub mod error;
pub mod format;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use advisor_core::WeatherSnapshot;

pub use client::WeatherApiClient;
pub use error::LookupError;
pub use format::{weather_summary, FormattedWeather};

// =============================================================================
// Trait
// =============================================================================

/// Service that resolves a free-text location to its current weather.
///
/// One lookup is one outbound round-trip. Implementations never retry.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Fetch current conditions for `location`.
    ///
    /// Empty, unknown, or ambiguous locations fail with [`LookupError`].
    async fn current(&self, location: &str) -> Result<WeatherSnapshot, LookupError>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock weather service that serves synthetic snapshots for known cities.
///
/// Records every requested location so tests can assert on the number and
/// order of outbound lookups.
#[derive(Debug, Default)]
pub struct MockWeatherLookup {
    known: HashMap<String, (String, String)>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockWeatherLookup {
    /// A mock that knows no locations; every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a city (name, country). Lookups match case-insensitively.
    pub fn with_location(mut self, name: &str, country: &str) -> Self {
        self.known.insert(
            name.to_lowercase(),
            (name.to_string(), country.to_string()),
        );
        self
    }

    /// Number of lookups issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Locations requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WeatherLookup for MockWeatherLookup {
    async fn current(&self, location: &str) -> Result<WeatherSnapshot, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(location.to_string());
        }

        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(LookupError::EmptyLocation);
        }

        let (name, country) =
            self.known
                .get(&trimmed.to_lowercase())
                .ok_or_else(|| LookupError::Provider {
                    status: 400,
                    message: "No matching location found.".to_string(),
                })?;

        tracing::debug!(location = %name, "Mock weather snapshot generated");
        Ok(synthetic_snapshot(name, country))
    }
}

/// Build a plausible snapshot for `name, country` with fixed readings.
pub fn synthetic_snapshot(name: &str, country: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location: name.to_string(),
        region: String::new(),
        country: country.to_string(),
        temp_c: 21.0,
        temp_f: 69.8,
        feelslike_c: 20.5,
        feelslike_f: 68.9,
        condition: "Sunny".to_string(),
        condition_icon: "//cdn.weatherapi.com/weather/64x64/day/113.png".to_string(),
        humidity: 48,
        wind_kph: 9.4,
        wind_dir: "SW".to_string(),
        precip_mm: 0.0,
        uv: 5.0,
        vis_km: 10.0,
        local_time: "2026-10-19 12:00".to_string(),
        fetched_at: Utc::now(),
        raw: serde_json::json!({
            "location": {"name": name, "country": country, "localtime": "2026-10-19 12:00"},
            "current": {"temp_c": 21.0, "condition": {"text": "Sunny"}}
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_lookup_known_city() {
        let mock = MockWeatherLookup::new().with_location("Tokyo", "Japan");
        let snap = mock.current("tokyo").await.unwrap();
        assert_eq!(snap.location, "Tokyo");
        assert_eq!(snap.country, "Japan");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_lookup_unknown_city() {
        let mock = MockWeatherLookup::new();
        let err = mock.current("Atlantis").await.unwrap_err();
        assert!(matches!(err, LookupError::Provider { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_mock_lookup_empty_location() {
        let mock = MockWeatherLookup::new().with_location("Tokyo", "Japan");
        let err = mock.current("   ").await.unwrap_err();
        assert!(matches!(err, LookupError::EmptyLocation));
    }

    #[tokio::test]
    async fn test_repeated_lookup_keeps_identity_fields() {
        let mock = MockWeatherLookup::new().with_location("London", "United Kingdom");
        let first = mock.current("London").await.unwrap();
        let second = mock.current("London").await.unwrap();
        assert_eq!(first.location, second.location);
        assert_eq!(first.country, second.country);
        assert_eq!(mock.requested(), vec!["London", "London"]);
    }
}
