use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Locale used to pick prompt templates, UI strings, and example prompts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (default).
    #[default]
    En,
    /// Japanese.
    Ja,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 2] = [Language::En, Language::Ja];

    /// The locale tag, e.g. `"en"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    /// Parse a locale tag. Case and surrounding whitespace are ignored.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ja" => Some(Language::Ja),
            _ => None,
        }
    }

    /// Parse a locale tag, falling back to English for anything unknown.
    pub fn from_tag_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Structs
// =============================================================================

/// A point-in-time weather reading for one location.
///
/// Immutable once fetched. The provider payload is kept verbatim in `raw`
/// so it can be handed to the model or dumped with the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Location name as resolved by the provider (e.g. "Tokyo").
    pub location: String,
    pub region: String,
    pub country: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    /// Condition text, e.g. "Partly cloudy".
    pub condition: String,
    /// Protocol-relative icon URL from the provider.
    pub condition_icon: String,
    /// Relative humidity in percent.
    pub humidity: u32,
    pub wind_kph: f64,
    /// Compass direction, e.g. "NNE".
    pub wind_dir: String,
    pub precip_mm: f64,
    pub uv: f64,
    pub vis_km: f64,
    /// Local time at the location, as reported by the provider.
    pub local_time: String,
    /// When this snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Raw provider payload.
    pub raw: serde_json::Value,
}

impl WeatherSnapshot {
    /// "Name, Country" label used in displays and prompts.
    pub fn place(&self) -> String {
        format!("{}, {}", self.location, self.country)
    }
}

// =============================================================================
// Tests
// =============================================================================
