use crate::{
    app::state::View,
    cache::CachedForecast,
    data::openweather::CurrentSnapshot,
    domain::forecast::Coords,
    service::ServiceError,
};

/// Payload of the location-refresh bus event.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRefresh {
    pub city: Option<String>,
    pub forced: bool,
}

#[derive(Debug)]
pub enum AppEvent {
    Bootstrap,
    SearchSubmitted(String),
    /// "Use my location"; `None` when no position is available.
    LocationRequested(Option<Coords>),
    /// Reload the five-day panel for the active city or the default location.
    FiveDayRequested,
    TabSelected(View),
    DaySelected(String),
    ChartToggled,
    FavoriteAdded(String),
    FavoriteRemoved(String),
    FavoriteChosen(String),
    ClearCache,
    LocationRefreshed(LocationRefresh),
    LocationResolved {
        token: u64,
        city: String,
    },
    CurrentLoaded {
        token: u64,
        snapshot: CurrentSnapshot,
        forced: bool,
    },
    CurrentFailed {
        token: u64,
        error: ServiceError,
    },
    ForecastLoaded {
        token: u64,
        city: Option<String>,
        forecast: CachedForecast,
    },
    ForecastFailed {
        token: u64,
        error: ServiceError,
    },
    BackgroundLoaded {
        city: String,
        url: Option<String>,
    },
    /// Deferred start of the city clock after the today panel renders.
    ClockStarted {
        city: String,
        offset_secs: i32,
    },
    Quit,
}

impl AppEvent {
    /// Completion events report back from spawned work.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::LocationResolved { .. }
                | Self::CurrentLoaded { .. }
                | Self::CurrentFailed { .. }
                | Self::ForecastLoaded { .. }
                | Self::ForecastFailed { .. }
                | Self::BackgroundLoaded { .. }
                | Self::ClockStarted { .. }
        )
    }
}
