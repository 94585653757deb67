use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One complete forecast payload for a location at a point in time.
///
/// Field names follow the forecast API's camelCase JSON. A snapshot is never
/// patched; a successful fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub currently: Currently,
    #[serde(default)]
    pub hourly: HourlyBlock,
    #[serde(default)]
    pub daily: DailyBlock,
    #[serde(default)]
    pub minutely: MinutelyBlock,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
}

impl WeatherSnapshot {
    /// Observation time of the current conditions.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.currently.time, 0)
    }

    pub fn first_alert(&self) -> Option<&Alert> {
        self.alerts.first()
    }
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Currently {
    /// Epoch seconds
    pub time: i64,
    pub summary: Option<String>,
    pub icon: String,
    pub temperature: f64,
    pub apparent_temperature: f64,
    /// Relative humidity, 0..=1
    pub humidity: f64,
    pub dew_point: f64,
    /// Direction the wind comes from, in degrees
    pub wind_bearing: f64,
    pub wind_speed: f64,
    pub wind_gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HourlyBlock {
    pub summary: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyBlock {
    pub summary: String,
    pub icon: String,
    pub data: Vec<DayForecast>,
}

/// Next-hour precipitation series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MinutelyBlock {
    pub summary: String,
    pub icon: String,
    pub data: Vec<MinuteSample>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DayForecast {
    /// Epoch seconds at the start of the day
    pub time: i64,
    pub icon: String,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub precip_probability: f64,
    pub sunrise_time: Option<i64>,
    pub sunset_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MinuteSample {
    pub time: Option<i64>,
    pub precip_probability: f64,
    /// Millimetres (or inches) per hour
    pub precip_intensity: f64,
}

/// Severe weather alert issued for the location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    pub title: String,
    /// Epoch seconds the alert starts
    pub time: i64,
    /// Epoch seconds the alert ends
    pub expires: Option<i64>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub uri: Option<String>,
}

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
