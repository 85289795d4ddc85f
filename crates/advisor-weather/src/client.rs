//! WeatherAPI.com client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use advisor_core::config::WeatherConfig;
use advisor_core::WeatherSnapshot;

use crate::error::LookupError;
use crate::WeatherLookup;

/// Client for the `current.json` endpoint of WeatherAPI.com.
pub struct WeatherApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    air_quality: bool,
}

impl WeatherApiClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            air_quality: config.air_quality,
        })
    }
}

#[async_trait]
impl WeatherLookup for WeatherApiClient {
    async fn current(&self, location: &str) -> Result<WeatherSnapshot, LookupError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(LookupError::EmptyLocation);
        }
        if self.api_key.is_empty() {
            return Err(LookupError::MissingApiKey);
        }

        let url = format!("{}/current.json", self.base_url);
        let aqi = if self.air_quality { "yes" } else { "no" };
        tracing::debug!(location = %location, "Fetching current weather");

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", location), ("aqi", aqi)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = provider_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            tracing::warn!(
                location = %location,
                status = status.as_u16(),
                message = %message,
                "Weather provider rejected lookup"
            );
            return Err(LookupError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))?;
        let snapshot = parse_current(raw)?;

        tracing::info!(
            location = %snapshot.location,
            country = %snapshot.country,
            temp_c = snapshot.temp_c,
            "Weather fetched"
        );
        Ok(snapshot)
    }
}

// =============================================================================
// Provider payload
// =============================================================================

#[derive(Deserialize)]
struct CurrentPayload {
    location: PayloadLocation,
    current: PayloadCurrent,
}

#[derive(Deserialize)]
struct PayloadLocation {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    localtime: String,
}

#[derive(Deserialize)]
struct PayloadCurrent {
    temp_c: f64,
    temp_f: f64,
    feelslike_c: f64,
    feelslike_f: f64,
    condition: PayloadCondition,
    humidity: f64,
    wind_kph: f64,
    #[serde(default)]
    wind_dir: String,
    #[serde(default)]
    precip_mm: f64,
    #[serde(default)]
    uv: f64,
    #[serde(default)]
    vis_km: f64,
}

#[derive(Deserialize)]
struct PayloadCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Convert a `current.json` payload into a snapshot, keeping the payload as `raw`.
pub fn parse_current(raw: serde_json::Value) -> Result<WeatherSnapshot, LookupError> {
    let payload: CurrentPayload =
        serde_json::from_value(raw.clone()).map_err(|e| LookupError::Decode(e.to_string()))?;
    let CurrentPayload { location, current } = payload;

    Ok(WeatherSnapshot {
        location: location.name,
        region: location.region,
        country: location.country,
        temp_c: current.temp_c,
        temp_f: current.temp_f,
        feelslike_c: current.feelslike_c,
        feelslike_f: current.feelslike_f,
        condition: current.condition.text,
        condition_icon: current.condition.icon,
        humidity: current.humidity.round().max(0.0) as u32,
        wind_kph: current.wind_kph,
        wind_dir: current.wind_dir,
        precip_mm: current.precip_mm,
        uv: current.uv,
        vis_km: current.vis_km,
        local_time: location.localtime,
        fetched_at: Utc::now(),
        raw,
    })
}

fn provider_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|p| p.error.message)
}

// =============================================================================
// Tests
// =============================================================================
