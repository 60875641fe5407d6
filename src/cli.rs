use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{app::state::View, domain::forecast::Coords};

pub const DEFAULT_CITY: &str = "Bucharest";

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ViewArg {
    Today,
    FiveDays,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Today => Self::Today,
            ViewArg::FiveDays => Self::FiveDays,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Parser, Clone)]
#[command(
    name = "forecast-deck",
    version,
    about = "Cached five-day weather forecast for the terminal"
)]
pub struct Cli {
    /// City to search for after the default location loads
    pub city: Option<String>,

    /// City shown on startup
    #[arg(long, default_value = DEFAULT_CITY)]
    pub default_city: String,

    /// Current latitude (requires --lon)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Current longitude (requires --lat)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Switch to the city at --lat/--lon, like the "use my location" button
    #[arg(long)]
    pub locate: bool,

    /// Tab to show; defaults to today, or five-days when --day is given
    #[arg(long, value_enum)]
    pub view: Option<ViewArg>,

    /// Expand one day by its card label, e.g. "26 Jul"
    #[arg(long)]
    pub day: Option<String>,

    /// Flip the saved chart panel state
    #[arg(long)]
    pub toggle_chart: bool,

    /// Cache lifetime in minutes
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub ttl_mins: u64,

    /// Save a city to favorites
    #[arg(long, value_name = "CITY")]
    pub add_favorite: Option<String>,

    /// Remove a city from favorites
    #[arg(long, value_name = "CITY")]
    pub remove_favorite: Option<String>,

    /// Show a saved favorite
    #[arg(long, value_name = "CITY")]
    pub favorite: Option<String>,

    /// Drop every cached forecast before loading
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the in-memory cache keys after loading
    #[arg(long)]
    pub cached_keys: bool,

    /// OpenWeather API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Pixabay API key; backgrounds are skipped without one
    #[arg(long, env = "PIXABAY_API_KEY", hide_env_values = true)]
    pub images_key: Option<String>,

    /// Directory holding the durable store
    #[arg(long, env = "FORECAST_DECK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Override the OpenWeather base URL
    #[arg(long)]
    pub forecast_url: Option<String>,

    /// Override the Pixabay search URL
    #[arg(long)]
    pub images_url: Option<String>,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        match (self.lat, self.lon) {
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("--lat and --lon must be provided together")
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn coords(&self) -> Option<Coords> {
        Some(Coords::new(self.lat?, self.lon?))
    }

    /// Day cards only live on the five-day tab.
    #[must_use]
    pub fn initial_view(&self) -> Option<View> {
        self.view
            .map(View::from)
            .or_else(|| self.day.as_ref().map(|_| View::FiveDays))
    }
}
