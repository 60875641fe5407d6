//! Event-driven orchestration of the "today" and five-day panels.
//!
//! UI actions and completions of spawned fetches both arrive as
//! [`AppEvent`]s on one channel. Every fetch carries a request token and a
//! completion is applied only while its token is the latest one issued for
//! that panel.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::{
    app::{
        events::{AppEvent, LocationRefresh},
        favorites::{ChartPreference, FavoriteError, Favorites},
        state::{CityClock, FiveDayState, Notice, RequestTokens, View},
    },
    bus::{EventBus, LOCATION_REFRESH, Subscription},
    cache::{CachedForecast, DEFAULT_TTL},
    data::{
        error::{ErrorKind, format_service_error},
        images::BackgroundClient,
        openweather::CurrentSnapshot,
        storage::KeyValueStore,
    },
    domain::{
        forecast::Coords,
        messages::{
            MSG_ALREADY_CURRENT_LOCATION, MSG_CITY_NOT_FOUND, MSG_ENTER_CITY,
            MSG_PERMISSION_DENIED,
        },
    },
    scheduler::{IdleOptions, Scheduler, Step},
    service::{ServiceError, WeatherService},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardOptions {
    pub ttl: Duration,
    /// Position used for the first "today" lookup, if one is known.
    pub startup_coords: Option<Coords>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            startup_coords: None,
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    pub running: bool,
    pub view: View,
    pub current_city: String,
    pub today: Option<CurrentSnapshot>,
    pub clock: Option<CityClock>,
    pub five_day: FiveDayState,
    pub background: Option<String>,
    pub chart_expanded: bool,
    pub favorites: Vec<String>,
    notices: Vec<Notice>,
    service: Arc<WeatherService>,
    images: Option<BackgroundClient>,
    saved: Favorites,
    chart_pref: ChartPreference,
    scheduler: Scheduler,
    bus: EventBus<LocationRefresh>,
    refresh_subscription: Option<Subscription<LocationRefresh>>,
    current_tokens: RequestTokens,
    forecast_tokens: RequestTokens,
    pending_forecast_city: Option<String>,
    in_flight: usize,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(
        service: Arc<WeatherService>,
        store: Arc<dyn KeyValueStore>,
        options: DashboardOptions,
    ) -> Self {
        let saved = Favorites::new(Arc::clone(&store));
        let chart_pref = ChartPreference::new(store);
        Self {
            running: true,
            view: View::default(),
            current_city: service.default_city().to_string(),
            today: None,
            clock: None,
            five_day: FiveDayState::default(),
            background: None,
            chart_expanded: chart_pref.expanded(),
            favorites: saved.list(),
            notices: Vec::new(),
            service,
            images: None,
            saved,
            chart_pref,
            scheduler: Scheduler::new(),
            bus: EventBus::new(),
            refresh_subscription: None,
            current_tokens: RequestTokens::default(),
            forecast_tokens: RequestTokens::default(),
            pending_forecast_city: None,
            in_flight: 0,
            options,
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: BackgroundClient) -> Self {
        self.images = Some(images);
        self
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn bus(&self) -> &EventBus<LocationRefresh> {
        &self.bus
    }

    /// Spawned work that has not reported back yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Handles queued events until nothing is queued and no spawned work is
    /// outstanding.
    pub async fn settle(
        &mut self,
        tx: &mpsc::Sender<AppEvent>,
        rx: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(_) if self.is_busy() => match rx.recv().await {
                    Some(event) => event,
                    None => return Ok(()),
                },
                Err(_) => return Ok(()),
            };
            self.handle_event(event, tx).await?;
        }
    }

    pub async fn handle_event(&mut self, event: AppEvent, tx: &mpsc::Sender<AppEvent>) -> Result<()> {
        if event.is_completion() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match event {
            AppEvent::Bootstrap => self.bootstrap(tx),
            AppEvent::SearchSubmitted(value) | AppEvent::FavoriteChosen(value) => {
                self.search(&value, tx);
            }
            AppEvent::LocationRequested(coords) => self.locate(coords, tx),
            AppEvent::FiveDayRequested => {
                let city = self.five_day.active_city.clone();
                self.load_five_day(city, tx);
            }
            AppEvent::TabSelected(view) => self.view = view,
            AppEvent::DaySelected(label) => {
                self.five_day.toggle_day(&label);
            }
            AppEvent::ChartToggled => {
                self.chart_expanded = !self.chart_expanded;
                self.chart_pref.set_expanded(self.chart_expanded);
            }
            AppEvent::FavoriteAdded(city) => self.add_favorite(&city),
            AppEvent::FavoriteRemoved(city) => self.remove_favorite(&city),
            AppEvent::ClearCache => {
                self.service.clear_cache();
                self.notices.push(Notice::info("Cache cleared"));
            }
            AppEvent::LocationRefreshed(refresh) => self.on_location_refresh(refresh, tx),
            AppEvent::LocationResolved { token, city } => self.on_location_resolved(token, city, tx),
            AppEvent::CurrentLoaded {
                token,
                snapshot,
                forced,
            } => self.on_current_loaded(token, snapshot, forced, tx),
            AppEvent::CurrentFailed { token, error } => {
                if self.current_tokens.is_current(token) {
                    self.notices.push(Notice::error(current_failure_message(&error)));
                } else {
                    tracing::debug!(token, "dropping stale current-weather failure");
                }
            }
            AppEvent::ForecastLoaded {
                token,
                city,
                forecast,
            } => self.on_forecast_loaded(token, city, forecast),
            AppEvent::ForecastFailed { token, error } => {
                if self.forecast_tokens.is_current(token) {
                    self.pending_forecast_city = None;
                    self.notices.push(Notice::error(format_service_error(&error)));
                } else {
                    tracing::debug!(token, "dropping stale forecast failure");
                }
            }
            AppEvent::BackgroundLoaded { city, url } => {
                if city.eq_ignore_ascii_case(&self.current_city) {
                    self.background = url;
                }
            }
            AppEvent::ClockStarted { city, offset_secs } => {
                if same_city(&city, &self.current_city) {
                    self.clock = CityClock::new(city, offset_secs);
                }
            }
            AppEvent::Quit => {
                if let Some(subscription) = self.refresh_subscription.take() {
                    subscription.dispose();
                }
                self.running = false;
            }
        }
        Ok(())
    }

    fn bootstrap(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.refresh_subscription.is_none() {
            let events = tx.clone();
            self.refresh_subscription = Some(self.bus.on(LOCATION_REFRESH, move |detail: &LocationRefresh| {
                if events
                    .try_send(AppEvent::LocationRefreshed(detail.clone()))
                    .is_err()
                {
                    tracing::warn!("event queue full, dropping location refresh");
                }
            }));
        }

        self.load_five_day(None, tx);

        let token = self.current_tokens.issue();
        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let coords = self.options.startup_coords;
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut city = service.default_city().to_string();
            if let Some(coords) = coords {
                match service.city_from_coords(coords).await {
                    Ok(found) => city = found,
                    Err(err) => tracing::debug!(error = %err, "keeping default city"),
                }
            }
            let event = match service.current_weather(&city).await {
                Ok(snapshot) => AppEvent::CurrentLoaded {
                    token,
                    snapshot,
                    forced: false,
                },
                Err(error) => AppEvent::CurrentFailed { token, error },
            };
            report(&tx, event).await;
        });
    }

    fn search(&mut self, value: &str, tx: &mpsc::Sender<AppEvent>) {
        let city = value.trim();
        if city.is_empty() {
            self.notices.push(Notice::info(MSG_ENTER_CITY));
            return;
        }
        self.fetch_current(city.to_string(), false, tx);
        self.load_five_day(Some(city.to_string()), tx);
    }

    fn locate(&mut self, coords: Option<Coords>, tx: &mpsc::Sender<AppEvent>) {
        let Some(coords) = coords else {
            self.notices.push(Notice::error(MSG_PERMISSION_DENIED));
            return;
        };
        let token = self.current_tokens.issue();
        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = match service.city_from_coords(coords).await {
                Ok(city) => AppEvent::LocationResolved { token, city },
                Err(error) => AppEvent::CurrentFailed { token, error },
            };
            report(&tx, event).await;
        });
    }

    fn on_location_resolved(&mut self, token: u64, city: String, tx: &mpsc::Sender<AppEvent>) {
        if !self.current_tokens.is_current(token) {
            tracing::debug!(token, "dropping stale location");
            return;
        }
        if same_city(&city, &self.current_city) {
            self.notices.push(Notice::info(MSG_ALREADY_CURRENT_LOCATION));
            return;
        }
        self.fetch_current(city, true, tx);
    }

    fn fetch_current(&mut self, city: String, forced: bool, tx: &mpsc::Sender<AppEvent>) {
        let token = self.current_tokens.issue();
        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = match service.current_weather(&city).await {
                Ok(snapshot) => AppEvent::CurrentLoaded {
                    token,
                    snapshot,
                    forced,
                },
                Err(error) => AppEvent::CurrentFailed { token, error },
            };
            report(&tx, event).await;
        });
    }

    fn on_current_loaded(
        &mut self,
        token: u64,
        snapshot: CurrentSnapshot,
        forced: bool,
        tx: &mpsc::Sender<AppEvent>,
    ) {
        if !self.current_tokens.is_current(token) {
            tracing::debug!(token, city = %snapshot.city, "dropping stale current weather");
            return;
        }
        let city = snapshot.city.clone();
        self.current_city = city.clone();
        self.start_clock(city.clone(), snapshot.timezone_offset_secs, tx);
        self.today = Some(snapshot);
        self.schedule_background(city.clone(), tx);

        let delivered = self.bus.emit(
            LOCATION_REFRESH,
            &LocationRefresh {
                city: Some(city.clone()),
                forced,
            },
        );
        tracing::debug!(city = %city, delivered, "location refresh emitted");
        if forced {
            self.notices
                .push(Notice::info(format!("Location updated: {city}")));
        }
    }

    fn on_location_refresh(&mut self, refresh: LocationRefresh, tx: &mpsc::Sender<AppEvent>) {
        let city = refresh
            .city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if !refresh.forced
            && let Some(city) = &city
            && [&self.five_day.active_city, &self.pending_forecast_city]
                .into_iter()
                .flatten()
                .any(|shown| same_city(city, shown))
        {
            tracing::debug!(city = %city, "five-day panel already on this city");
            return;
        }
        if let Some(city) = &city {
            self.five_day.set_active_city(Some(city.as_str()));
        }
        self.load_five_day(city, tx);
    }

    /// Loads by city when one is given, otherwise for the default location.
    fn load_five_day(&mut self, city: Option<String>, tx: &mpsc::Sender<AppEvent>) {
        let token = self.forecast_tokens.issue();
        self.pending_forecast_city.clone_from(&city);
        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let ttl = self.options.ttl;
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = match &city {
                Some(name) => service.forecast_by_city(name, ttl).await,
                None => service.current_location_forecast(ttl).await,
            };
            let event = match result {
                Ok(forecast) => AppEvent::ForecastLoaded {
                    token,
                    city,
                    forecast,
                },
                Err(error) => AppEvent::ForecastFailed { token, error },
            };
            report(&tx, event).await;
        });
    }

    fn on_forecast_loaded(&mut self, token: u64, city: Option<String>, forecast: CachedForecast) {
        if !self.forecast_tokens.is_current(token) {
            tracing::debug!(token, "dropping stale forecast");
            return;
        }
        self.pending_forecast_city = None;
        tracing::debug!(source = ?forecast.source, days = forecast.data().days.len(), "forecast applied");
        self.five_day.set_forecast(forecast);
        if let Some(city) = city.as_deref() {
            self.five_day.set_active_city(Some(city));
        }
    }

    /// Restarts the city clock on the next frame; the today panel renders
    /// first.
    fn start_clock(&mut self, city: String, offset_secs: i32, tx: &mpsc::Sender<AppEvent>) {
        self.in_flight += 1;
        let tx = tx.clone();
        self.scheduler.schedule_frame(Step::future(move || async move {
            tx.send(AppEvent::ClockStarted { city, offset_secs }).await?;
            Ok(())
        }));
    }

    fn schedule_background(&mut self, city: String, tx: &mpsc::Sender<AppEvent>) {
        let Some(images) = self.images.clone() else {
            return;
        };
        self.in_flight += 1;
        let tx = tx.clone();
        self.scheduler.schedule_idle(
            Step::future(move || async move {
                let url = match images.background_for(&city).await {
                    Ok(url) => url,
                    Err(err) => {
                        tracing::debug!(city = %city, error = %err, "background unavailable");
                        None
                    }
                };
                tx.send(AppEvent::BackgroundLoaded { city, url }).await?;
                Ok(())
            }),
            IdleOptions::default(),
        );
    }

    fn add_favorite(&mut self, city: &str) {
        match self.saved.add(city) {
            Ok(_) => self.favorites = self.saved.list(),
            Err(err @ (FavoriteError::TypeCityFirst | FavoriteError::AlreadyFavorite)) => {
                self.notices.push(Notice::info(err.to_string()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save favorite");
                self.notices.push(Notice::error(err.to_string()));
            }
        }
    }

    fn remove_favorite(&mut self, city: &str) {
        match self.saved.remove(city) {
            Ok(_) => self.favorites = self.saved.list(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to remove favorite");
                self.notices.push(Notice::error(err.to_string()));
            }
        }
    }
}

async fn report(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if tx.send(event).await.is_err() {
        tracing::debug!("event queue closed, dropping completion");
    }
}

fn same_city(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A failed "today" lookup for a typed city reads as a misspelling.
fn current_failure_message(error: &ServiceError) -> String {
    match error.kind() {
        ErrorKind::NotFound => MSG_CITY_NOT_FOUND.to_string(),
        ErrorKind::Http if error.status() == Some(404) => MSG_CITY_NOT_FOUND.to_string(),
        _ => format_service_error(error),
    }
}
