use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::data::{
    error::ServiceError,
    http::{build_client, fetch_json},
};

pub const PIXABAY_URL: &str = "https://pixabay.com/api/";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageHit {
    #[serde(rename = "largeImageURL")]
    pub large_image_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<ImageHit>,
}

/// Background photo search. The city query runs first; an empty result
/// falls back to a generic buildings query.
#[derive(Debug, Clone)]
pub struct BackgroundClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BackgroundClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(PIXABAY_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(8),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn search(&self, category: &str, query: &str) -> Result<Vec<ImageHit>, ServiceError> {
        let request = self.client.get(&self.base_url).query(&[
            ("image_type", "photo"),
            ("category", category),
            ("orientation", "horizontal"),
            ("q", query),
            ("page", "1"),
            ("per_page", "10"),
            ("key", self.api_key.as_str()),
        ]);
        let payload: SearchResponse = fetch_json(request, "images").await?;
        Ok(payload.hits)
    }

    pub async fn background_for(&self, city: &str) -> Result<Option<String>, ServiceError> {
        let mut hits = self.search("travel", city).await?;
        if hits.is_empty() {
            tracing::debug!(city, "no city photos, using generic backdrop");
            hits = self.search("buildings", "").await?;
        }
        Ok(choose_background(&hits, &mut rand::rng()).map(str::to_string))
    }
}

pub fn choose_background<'a, R: Rng + ?Sized>(hits: &'a [ImageHit], rng: &mut R) -> Option<&'a str> {
    if hits.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..hits.len());
    Some(hits[idx].large_image_url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_background_handles_empty_and_single() {
        let mut rng = rand::rng();
        assert_eq!(choose_background(&[], &mut rng), None);

        let hits = vec![ImageHit {
            large_image_url: "https://img.example/one.jpg".to_string(),
        }];
        assert_eq!(
            choose_background(&hits, &mut rng),
            Some("https://img.example/one.jpg")
        );
    }

    #[test]
    fn choose_background_stays_in_bounds() {
        let hits: Vec<ImageHit> = (0..4)
            .map(|i| ImageHit {
                large_image_url: format!("https://img.example/{i}.jpg"),
            })
            .collect();
        let mut rng = rand::rng();
        for _ in 0..50 {
            let url = choose_background(&hits, &mut rng).unwrap();
            assert!(hits.iter().any(|h| h.large_image_url == url));
        }
    }
}
