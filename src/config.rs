use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

use anyhow::Context;
use regex::Regex;

use crate::{cli::Cli, data::images::PIXABAY_URL, data::openweather::OPENWEATHER_URL};

const STORE_FILE: &str = "store.json";

/// Runtime settings resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub openweather_key: String,
    pub images_key: Option<String>,
    /// `None` keeps everything in memory for this run.
    pub store_path: Option<PathBuf>,
    pub default_city: String,
    pub ttl: Duration,
    pub forecast_url: String,
    pub images_url: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let openweather_key = cli
            .api_key
            .as_deref()
            .map(sanitize_key)
            .filter(|key| !key.is_empty())
            .context("an OpenWeather API key is required (--api-key or OPENWEATHER_API_KEY)")?;
        let images_key = cli
            .images_key
            .as_deref()
            .map(sanitize_key)
            .filter(|key| !key.is_empty());

        Ok(Self {
            openweather_key,
            images_key,
            store_path: store_path(cli.cache_dir.as_deref()),
            default_city: cli.default_city.trim().to_string(),
            ttl: Duration::from_secs(cli.ttl_mins.saturating_mul(60)),
            forecast_url: cli
                .forecast_url
                .clone()
                .unwrap_or_else(|| OPENWEATHER_URL.to_string()),
            images_url: cli
                .images_url
                .clone()
                .unwrap_or_else(|| PIXABAY_URL.to_string()),
        })
    }
}

fn key_noise() -> Option<&'static Regex> {
    static NOISE: OnceLock<Option<Regex>> = OnceLock::new();
    NOISE
        .get_or_init(|| Regex::new(r#"^&?(?:key|appid)=|["';\s]"#).ok())
        .as_ref()
}

/// Strips what copy-pasted keys tend to drag along: quotes, semicolons,
/// whitespace and a leading `&key=` / `appid=` query fragment.
#[must_use]
pub fn sanitize_key(raw: &str) -> String {
    match key_noise() {
        Some(noise) => noise.replace_all(raw.trim(), "").into_owned(),
        None => raw.trim().to_string(),
    }
}

fn store_path(cache_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = cache_dir {
        return Some(dir.join(STORE_FILE));
    }
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join("forecast-deck")
            .join(STORE_FILE),
    )
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn sanitize_strips_pasted_noise() {
        assert_eq!(sanitize_key("\"abc123\";"), "abc123");
        assert_eq!(sanitize_key("&key=abc123"), "abc123");
        assert_eq!(sanitize_key("appid=abc123 "), "abc123");
        assert_eq!(sanitize_key("'abc123'"), "abc123");
        assert_eq!(sanitize_key("abc123"), "abc123");
    }

    #[test]
    fn cli_values_resolve_into_config() {
        let cli = Cli::parse_from([
            "forecast-deck",
            "--api-key",
            "\"ow-key\"",
            "--images-key",
            "&key=px-key",
            "--cache-dir",
            "/tmp/deck",
            "--ttl-mins",
            "3",
            "--forecast-url",
            "http://127.0.0.1:9999",
        ]);

        let config = Config::from_cli(&cli).expect("config");

        assert_eq!(config.openweather_key, "ow-key");
        assert_eq!(config.images_key.as_deref(), Some("px-key"));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/deck/store.json")));
        assert_eq!(config.ttl, Duration::from_secs(180));
        assert_eq!(config.forecast_url, "http://127.0.0.1:9999");
        assert_eq!(config.images_url, PIXABAY_URL);
        assert_eq!(config.default_city, "Bucharest");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let cli = Cli::parse_from(["forecast-deck", "--api-key", "\"\""]);
        let err = Config::from_cli(&cli).expect_err("no usable key");
        assert!(err.to_string().contains("OpenWeather API key"));
    }
}
