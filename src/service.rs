//! Forecast lookups by coordinates, city name or the configured default
//! city, answered from the two-tier cache whenever a fresh entry exists.

use std::{sync::Arc, time::Duration};

use crate::{
    cache::{CachedForecast, ForecastCache, KeyKind, cache_key},
    data::openweather::{CurrentSnapshot, OpenWeatherClient},
    domain::forecast::{Coords, ForecastPayload, ForecastResult, normalize_daily},
};

pub use crate::data::error::ServiceError;

const CITY_LABEL: &str = "coords:city";
const CURRENT_LABEL: &str = "coords:current";

#[derive(Debug, Clone)]
pub struct WeatherService {
    client: OpenWeatherClient,
    cache: Arc<ForecastCache>,
    default_city: String,
}

impl WeatherService {
    pub fn new(
        client: OpenWeatherClient,
        cache: Arc<ForecastCache>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cache,
            default_city: default_city.into(),
        }
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    pub async fn forecast_by_coords(
        &self,
        coords: Coords,
        ttl: Duration,
    ) -> Result<CachedForecast, ServiceError> {
        let key = cache_key(KeyKind::Coords, &coords.key_fragment());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        tracing::debug!(key = %key, "cache miss, fetching forecast");
        let raw = self.client.forecast(coords).await?;
        let result = normalize_payload(raw)?;
        Ok(self.cache.put(&key, result, ttl))
    }

    /// Geocoding results are not cached, so a miss on the `city:` key always
    /// resolves coordinates again before the coordinate lookup.
    pub async fn forecast_by_city(
        &self,
        name: &str,
        ttl: Duration,
    ) -> Result<CachedForecast, ServiceError> {
        if let Some(hit) = self.cache.get(&cache_key(KeyKind::City, name)) {
            return Ok(hit);
        }

        let places = self.client.geocode(name, CITY_LABEL).await?;
        let Some(place) = places.first() else {
            return Err(ServiceError::NotFound {
                city: name.to_string(),
            });
        };
        self.forecast_by_coords(place.coords(), ttl).await
    }

    pub async fn current_location_forecast(
        &self,
        ttl: Duration,
    ) -> Result<CachedForecast, ServiceError> {
        let places = self
            .client
            .geocode(&self.default_city, CURRENT_LABEL)
            .await?;
        let place = places.first().ok_or(ServiceError::Coords)?;
        self.forecast_by_coords(place.coords(), ttl).await
    }

    pub async fn city_from_coords(&self, coords: Coords) -> Result<String, ServiceError> {
        let places = self.client.reverse_geocode(coords).await?;
        places
            .into_iter()
            .find_map(|place| place.name.filter(|name| !name.trim().is_empty()))
            .ok_or(ServiceError::Coords)
    }

    pub async fn current_weather(&self, city: &str) -> Result<CurrentSnapshot, ServiceError> {
        self.client.current_weather(city).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_keys(&self) -> Vec<String> {
        self.cache.memory_keys()
    }
}

fn normalize_payload(raw: serde_json::Value) -> Result<ForecastResult, ServiceError> {
    let payload: ForecastPayload =
        serde_json::from_value(raw.clone()).map_err(|err| ServiceError::Parse {
            label: "forecast".to_string(),
            message: err.to_string(),
        })?;
    Ok(ForecastResult {
        days: normalize_daily(&payload.list),
        raw,
    })
}
