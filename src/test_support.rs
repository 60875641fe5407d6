use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::{
    cache::{CacheEntry, CacheSource, CachedForecast},
    domain::forecast::{
        ForecastPayload, ForecastResult, RawMain, RawSample, RawWeather, RawWind, normalize_daily,
    },
};

fn weather_main_for(icon: &str) -> &'static str {
    match icon.get(..2) {
        Some("01") => "Clear",
        Some("09" | "10") => "Rain",
        Some("11") => "Thunderstorm",
        Some("13") => "Snow",
        _ => "Clouds",
    }
}

pub(crate) fn raw_sample(dt_txt: &str, temp: f64, temp_min: f64, temp_max: f64, icon: &str) -> RawSample {
    RawSample {
        dt: 0,
        dt_txt: dt_txt.to_string(),
        main: RawMain {
            temp,
            temp_min,
            temp_max,
            humidity: Some(60.0),
            pressure: Some(1012.0),
        },
        weather: vec![RawWeather {
            main: Some(weather_main_for(icon).to_string()),
            icon: Some(icon.to_string()),
        }],
        wind: Some(RawWind { speed: Some(3.5) }),
    }
}

pub(crate) fn raw_sample_without_weather(dt_txt: &str, temp: f64) -> RawSample {
    RawSample {
        weather: Vec::new(),
        wind: None,
        ..raw_sample(dt_txt, temp, temp, temp, "01d")
    }
}

pub(crate) fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 26, 6, 0, 0)
        .single()
        .expect("valid fixed start")
}

pub(crate) fn forecast_payload_json() -> serde_json::Value {
    json!({
        "cod": "200",
        "cnt": 4,
        "list": [
            {
                "dt": 1_721_995_200,
                "dt_txt": "2024-07-26 12:00:00",
                "main": { "temp": 29.4, "temp_min": 28.1, "temp_max": 30.2, "humidity": 40, "pressure": 1011 },
                "weather": [{ "main": "Clear", "icon": "01d" }],
                "wind": { "speed": 2.1 }
            },
            {
                "dt": 1_722_006_000,
                "dt_txt": "2024-07-26 15:00:00",
                "main": { "temp": 31.0, "temp_min": 30.5, "temp_max": 31.6, "humidity": 35, "pressure": 1010 },
                "weather": [{ "main": "Clouds", "icon": "02d" }],
                "wind": { "speed": 3.4 }
            },
            {
                "dt": 1_722_038_400,
                "dt_txt": "2024-07-27 00:00:00",
                "main": { "temp": 21.2, "temp_min": 20.4, "temp_max": 21.2, "humidity": 70, "pressure": 1013 },
                "weather": [{ "main": "Rain", "icon": "10n" }],
                "wind": { "speed": 1.2 }
            },
            {
                "dt": 1_722_049_200,
                "dt_txt": "2024-07-27 03:00:00",
                "main": { "temp": 19.6, "temp_min": 19.5, "temp_max": 19.9, "humidity": 78, "pressure": 1014 },
                "weather": [{ "main": "Rain", "icon": "10n" }],
                "wind": { "speed": 0.8 }
            }
        ]
    })
}

pub(crate) fn sample_forecast_result() -> ForecastResult {
    let raw = forecast_payload_json();
    let payload: ForecastPayload = serde_json::from_value(raw.clone()).expect("valid fixture");
    ForecastResult {
        days: normalize_daily(&payload.list),
        raw,
    }
}

pub(crate) fn cached(data: ForecastResult, source: CacheSource) -> CachedForecast {
    CachedForecast {
        entry: CacheEntry {
            fetched_at: fixed_start(),
            ttl_ms: 600_000,
            data,
        },
        source,
    }
}

pub(crate) fn geo_payload(name: &str, lat: f64, lon: f64) -> serde_json::Value {
    json!([{ "name": name, "lat": lat, "lon": lon, "country": "RO" }])
}

pub(crate) fn current_payload(name: &str, temp: f64) -> serde_json::Value {
    json!({
        "name": name,
        "main": { "temp": temp, "temp_min": temp - 3.0, "temp_max": temp + 2.0 },
        "weather": [{ "main": "Clear", "icon": "01d" }],
        "sys": { "country": "RO", "sunrise": 1_721_963_100, "sunset": 1_722_016_800 },
        "timezone": 10_800
    })
}
