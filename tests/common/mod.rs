#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use forecast_deck::{
    cache::{ForecastCache, clock::ManualClock},
    data::{openweather::OpenWeatherClient, storage::KeyValueStore},
    service::WeatherService,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub const GEOCODE_PATH: &str = "/geo/1.0/direct";
pub const FORECAST_PATH: &str = "/data/2.5/forecast";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 26, 6, 0, 0)
        .single()
        .expect("valid start")
}

pub fn forecast_body() -> Value {
    json!({
        "cod": "200",
        "list": [
            {
                "dt_txt": "2024-07-26 12:00:00",
                "main": { "temp": 29.4, "temp_min": 28.1, "temp_max": 30.2, "humidity": 40, "pressure": 1011 },
                "weather": [{ "main": "Clear", "icon": "01d" }],
                "wind": { "speed": 2.1 }
            },
            {
                "dt_txt": "2024-07-26 15:00:00",
                "main": { "temp": 31.0, "temp_min": 30.5, "temp_max": 31.6, "humidity": 35, "pressure": 1010 },
                "weather": [{ "main": "Clouds", "icon": "02d" }],
                "wind": { "speed": 3.4 }
            },
            {
                "dt_txt": "2024-07-27 00:00:00",
                "main": { "temp": 21.2, "temp_min": 20.4, "temp_max": 21.2, "humidity": 70, "pressure": 1013 },
                "weather": [{ "main": "Rain", "icon": "10n" }],
                "wind": { "speed": 1.2 }
            }
        ]
    })
}

/// Geocodes `Paris` (in any case) and serves one forecast for every position.
pub async fn openweather() -> MockServer {
    let server = MockServer::start().await;
    for query in ["Paris", "paris", "PARIS"] {
        Mock::given(method("GET"))
            .and(path(GEOCODE_PATH))
            .and(query_param("q", query))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "name": "Paris", "lat": 48.85, "lon": 2.35, "country": "FR" }])),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;
    server
}

pub fn service(
    base_url: &str,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<ManualClock>,
) -> (WeatherService, Arc<ForecastCache>) {
    let cache = Arc::new(ForecastCache::new(store, clock));
    let client = OpenWeatherClient::with_base_url(base_url, "test-key");
    (
        WeatherService::new(client, Arc::clone(&cache), "Paris"),
        cache,
    )
}

pub async fn requests_to(server: &MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}
