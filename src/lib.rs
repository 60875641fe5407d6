pub mod app;
pub mod bus;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod scheduler;
pub mod service;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use anyhow::{Context, Result};
use app::{
    dashboard::{Dashboard, DashboardOptions},
    events::AppEvent,
};
use cache::{ForecastCache, clock::SystemClock};
use cli::Cli;
use config::Config;
use data::{
    images::BackgroundClient,
    openweather::OpenWeatherClient,
    storage::{FileStore, KeyValueStore, MemoryStore},
};
use service::WeatherService;
use tokio::sync::mpsc;

pub async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;
    let config = Config::from_cli(&cli)?;

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using durable store");
            Arc::new(FileStore::new(path))
        }
        None => Arc::new(MemoryStore::new()),
    };
    let cache = Arc::new(ForecastCache::new(Arc::clone(&store), Arc::new(SystemClock)));
    let client = OpenWeatherClient::with_base_url(&config.forecast_url, &config.openweather_key);
    let service = Arc::new(WeatherService::new(client, cache, &config.default_city));

    let options = DashboardOptions {
        ttl: config.ttl,
        startup_coords: cli.coords(),
    };
    let mut dashboard = Dashboard::new(Arc::clone(&service), store, options);
    if let Some(key) = &config.images_key {
        dashboard = dashboard.with_images(BackgroundClient::with_base_url(&config.images_url, key));
    }

    let (tx, mut rx) = mpsc::channel::<AppEvent>(64);
    for event in session_events(&cli) {
        dashboard
            .handle_event(event, &tx)
            .await
            .context("dashboard event failed")?;
        dashboard.settle(&tx, &mut rx).await?;
    }

    print!("{}", ui::render(&dashboard));
    if cli.cached_keys {
        for key in service.cached_keys() {
            println!("{key}");
        }
    }

    dashboard.handle_event(AppEvent::Quit, &tx).await
}

/// The scripted UI actions one invocation stands for, in order.
pub fn session_events(cli: &Cli) -> Vec<AppEvent> {
    let mut events = Vec::new();
    if cli.clear_cache {
        events.push(AppEvent::ClearCache);
    }
    if let Some(city) = &cli.add_favorite {
        events.push(AppEvent::FavoriteAdded(city.clone()));
    }
    if let Some(city) = &cli.remove_favorite {
        events.push(AppEvent::FavoriteRemoved(city.clone()));
    }
    if cli.toggle_chart {
        events.push(AppEvent::ChartToggled);
    }

    events.push(AppEvent::Bootstrap);

    if cli.locate {
        events.push(AppEvent::LocationRequested(cli.coords()));
    }
    if let Some(city) = &cli.favorite {
        events.push(AppEvent::FavoriteChosen(city.clone()));
    }
    if let Some(city) = &cli.city {
        events.push(AppEvent::SearchSubmitted(city.clone()));
    }
    if let Some(view) = cli.initial_view() {
        events.push(AppEvent::TabSelected(view));
    }
    if let Some(day) = &cli.day {
        events.push(AppEvent::DaySelected(day.clone()));
    }
    events
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::app::state::View;

    #[test]
    fn plain_run_only_bootstraps() {
        let cli = Cli::parse_from(["forecast-deck"]);
        let events = session_events(&cli);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AppEvent::Bootstrap));
    }

    #[test]
    fn flags_map_to_ordered_actions() {
        let cli = Cli::parse_from([
            "forecast-deck",
            "Cluj-Napoca",
            "--clear-cache",
            "--add-favorite",
            "Iasi",
            "--toggle-chart",
            "--lat",
            "44.43",
            "--lon",
            "26.1",
            "--locate",
            "--day",
            "27 Jul",
        ]);
        let events = session_events(&cli);

        assert!(matches!(events[0], AppEvent::ClearCache));
        assert!(matches!(&events[1], AppEvent::FavoriteAdded(city) if city == "Iasi"));
        assert!(matches!(events[2], AppEvent::ChartToggled));
        assert!(matches!(events[3], AppEvent::Bootstrap));
        assert!(matches!(events[4], AppEvent::LocationRequested(Some(_))));
        assert!(matches!(&events[5], AppEvent::SearchSubmitted(city) if city == "Cluj-Napoca"));
        assert!(matches!(events[6], AppEvent::TabSelected(View::FiveDays)));
        assert!(matches!(&events[7], AppEvent::DaySelected(day) if day == "27 Jul"));
        assert_eq!(events.len(), 8);
    }

    #[test]
    fn locate_without_coordinates_asks_anyway() {
        let cli = Cli::parse_from(["forecast-deck", "--locate"]);
        let events = session_events(&cli);
        assert!(matches!(events[1], AppEvent::LocationRequested(None)));
    }
}
