use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    cache::CachedForecast,
    domain::{
        chart::{CHART_POINTS, ChartSeries, chart_series},
        forecast::{DayAggregate, ForecastPayload},
    },
};

/// What the five-day panel is showing.
#[derive(Debug, Clone, Default)]
pub struct FiveDayState {
    pub last_forecast: Option<CachedForecast>,
    /// Card label (`"26 Jul"`) of the expanded day.
    pub selected_day: Option<String>,
    pub active_city: Option<String>,
}

impl FiveDayState {
    pub fn set_forecast(&mut self, forecast: CachedForecast) {
        self.last_forecast = Some(forecast);
    }

    /// Blank input clears the active city.
    pub fn set_active_city(&mut self, city: Option<&str>) {
        self.active_city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
    }

    /// Selects `label`, or clears the selection when `label` is already
    /// selected. Returns whether a day is selected afterwards.
    pub fn toggle_day(&mut self, label: &str) -> bool {
        if self.selected_day.as_deref() == Some(label) {
            self.selected_day = None;
            false
        } else {
            self.selected_day = Some(label.to_string());
            true
        }
    }

    pub fn days(&self) -> &[DayAggregate] {
        match &self.last_forecast {
            Some(forecast) => &forecast.data().days,
            None => &[],
        }
    }

    /// First day whose card label matches the selection. Two dates sharing
    /// a label resolve to the earlier one.
    pub fn selected(&self) -> Option<&DayAggregate> {
        let label = self.selected_day.as_deref()?;
        self.days().iter().find(|day| day.card_label() == label)
    }

    pub fn chart(&self) -> Option<ChartSeries> {
        let raw = &self.last_forecast.as_ref()?.data().raw;
        let payload: ForecastPayload = serde_json::from_value(raw.clone()).ok()?;
        let series = chart_series(&payload.list, CHART_POINTS);
        (!series.is_empty()).then_some(series)
    }
}

/// Tab bar selection. The today panel is shown first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Today,
    FiveDays,
}

/// Wall clock of the city on the today panel, at the UTC offset the
/// current-weather payload reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityClock {
    pub city: String,
    offset: FixedOffset,
}

impl CityClock {
    /// `None` when the offset is outside +/- 24 hours.
    pub fn new(city: impl Into<String>, offset_secs: i32) -> Option<Self> {
        Some(Self {
            city: city.into(),
            offset: FixedOffset::east_opt(offset_secs)?,
        })
    }

    /// `HH:MM:SS` in the city's time zone.
    pub fn reading(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset).format("%H:%M:%S").to_string()
    }
}

/// Monotonic tokens for in-flight fetches. Only the most recently issued
/// token is current; completions carrying an older one are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTokens {
    latest: u64,
}

impl RequestTokens {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One user-facing notification line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}
