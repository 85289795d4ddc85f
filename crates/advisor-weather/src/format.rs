//! Presentation of weather snapshots for people and for the model.

use serde::{Deserialize, Serialize};

use advisor_core::WeatherSnapshot;

/// Display-ready weather fields returned by the HTTP API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormattedWeather {
    /// "Name, Country".
    pub location: String,
    /// "X°C / Y°F".
    pub temperature: String,
    pub condition: String,
    pub icon: String,
    pub feels_like: String,
    pub humidity: String,
    /// "K km/h DIR".
    pub wind: String,
    pub precipitation: String,
    pub uv_index: f64,
    pub visibility: String,
    pub local_time: String,
    /// Full provider payload.
    pub raw_data: serde_json::Value,
}

impl From<&WeatherSnapshot> for FormattedWeather {
    fn from(s: &WeatherSnapshot) -> Self {
        Self {
            location: s.place(),
            temperature: format!("{}°C / {}°F", s.temp_c, s.temp_f),
            condition: s.condition.clone(),
            icon: s.condition_icon.clone(),
            feels_like: format!("{}°C", s.feelslike_c),
            humidity: format!("{}%", s.humidity),
            wind: format!("{} km/h {}", s.wind_kph, s.wind_dir),
            precipitation: format!("{} mm", s.precip_mm),
            uv_index: s.uv,
            visibility: format!("{} km", s.vis_km),
            local_time: s.local_time.clone(),
            raw_data: s.raw.clone(),
        }
    }
}

/// Multi-line plain-text summary of a snapshot.
///
/// This is the text handed back to the model as the result of a
/// `get_weather` tool call.
pub fn weather_summary(s: &WeatherSnapshot) -> String {
    format!(
        "Weather in {place}:\n\
         - Temperature: {temp}°C (feels like {feels}°C)\n\
         - Condition: {condition}\n\
         - Humidity: {humidity}%\n\
         - Wind: {wind} km/h\n\
         - UV Index: {uv}\n\
         - Precipitation: {precip} mm\n\
         - Local time: {time}",
        place = s.place(),
        temp = s.temp_c,
        feels = s.feelslike_c,
        condition = s.condition,
        humidity = s.humidity,
        wind = s.wind_kph,
        uv = s.uv,
        precip = s.precip_mm,
        time = s.local_time,
    )
}
