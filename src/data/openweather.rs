use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    data::{
        error::ServiceError,
        http::{build_client, fetch_json},
    },
    domain::forecast::{Coords, round_half_up},
};

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org";

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const REVERSE_PATH: &str = "/geo/1.0/reverse";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const CURRENT_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoPlace {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeoPlace {
    pub fn coords(&self) -> Coords {
        Coords::new(self.lat, self.lon)
    }
}

/// Figures for the "today" panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSnapshot {
    pub city: String,
    pub current_temp: i64,
    pub today_max: i64,
    pub today_min: i64,
    pub sunrise: String,
    pub sunset: String,
    pub icon: String,
    pub country: Option<String>,
    pub timezone_offset_secs: i32,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: Option<String>,
    main: CurrentMain,
    #[serde(default)]
    weather: Vec<CurrentWeather>,
    sys: CurrentSys,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(OPENWEATHER_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(10),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn geocode(&self, city: &str, label: &str) -> Result<Vec<GeoPlace>, ServiceError> {
        let request = self
            .client
            .get(self.url(GEOCODE_PATH))
            .query(&[("q", city), ("appid", self.api_key.as_str())]);
        fetch_json(request, label).await
    }

    pub async fn reverse_geocode(&self, coords: Coords) -> Result<Vec<GeoPlace>, ServiceError> {
        let request = self.client.get(self.url(REVERSE_PATH)).query(&[
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("appid", self.api_key.clone()),
        ]);
        fetch_json(request, "coords:reverse").await
    }

    /// Five-day / 3-hour forecast, returned undecoded so it can be cached raw.
    pub async fn forecast(&self, coords: Coords) -> Result<serde_json::Value, ServiceError> {
        let request = self.client.get(self.url(FORECAST_PATH)).query(&[
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
            ("lang", "en".to_string()),
        ]);
        fetch_json(request, "forecast").await
    }

    pub async fn current_weather(&self, city: &str) -> Result<CurrentSnapshot, ServiceError> {
        let request = self.client.get(self.url(CURRENT_PATH)).query(&[
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", "en"),
        ]);
        let payload: CurrentResponse = fetch_json(request, "current").await?;
        Ok(snapshot_from(payload, city))
    }
}

fn snapshot_from(payload: CurrentResponse, requested: &str) -> CurrentSnapshot {
    let offset = payload.timezone;
    CurrentSnapshot {
        city: payload.name.unwrap_or_else(|| requested.to_string()),
        current_temp: round_half_up(payload.main.temp),
        today_max: round_half_up(payload.main.temp_max),
        today_min: round_half_up(payload.main.temp_min),
        sunrise: local_clock(payload.sys.sunrise, offset),
        sunset: local_clock(payload.sys.sunset, offset),
        icon: payload
            .weather
            .first()
            .and_then(|w| w.icon.clone())
            .unwrap_or_else(|| crate::domain::forecast::DEFAULT_ICON.to_string()),
        country: payload.sys.country,
        timezone_offset_secs: offset,
    }
}

/// `HH:MM` wall-clock time at the city's UTC offset.
pub(crate) fn local_clock(unix_secs: i64, offset_secs: i32) -> String {
    let Some(offset) = FixedOffset::east_opt(offset_secs) else {
        return String::new();
    };
    DateTime::from_timestamp(unix_secs, 0)
        .map(|at| at.with_timezone(&offset).format("%H:%M").to_string())
        .unwrap_or_default()
}
