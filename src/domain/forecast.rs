use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON: &str = "01d";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl Coords {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Cache identifier, `"<lat>,<lon>"` as the geocoder reported them.
    pub fn key_fragment(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

/// One 3-hour slice of the forecast list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSample {
    pub time: String,
    pub temp: i64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind: Option<f64>,
    pub weather: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub date: String,
    pub day_label: String,
    pub min: i64,
    pub max: i64,
    pub icon: String,
    pub periods: Vec<PeriodSample>,
}

impl DayAggregate {
    /// Compact card label such as `"26 Jul"`. The five-day view also uses it
    /// as the lookup key for the selected day.
    pub fn card_label(&self) -> String {
        parse_day(&self.date)
            .map(|date| date.format("%-d %b").to_string())
            .unwrap_or_else(|| self.date.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub raw: serde_json::Value,
    pub days: Vec<DayAggregate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub list: Vec<RawSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub dt: i64,
    pub dt_txt: String,
    pub main: RawMain,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
    pub wind: Option<RawWind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWeather {
    pub main: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
}

/// Rounds halves towards positive infinity, so `-2.5` becomes `-2`.
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn weekday_label(date: &str) -> String {
    parse_day(date)
        .map(|d| d.format("%a").to_string())
        .unwrap_or_default()
}

struct DayAccumulator {
    date: String,
    icon: String,
    min: f64,
    max: f64,
    periods: Vec<PeriodSample>,
}

/// Groups 3-hour samples by calendar date in first-seen order.
///
/// `min` and `max` track every `temp`, `temp_min` and `temp_max` seen for
/// the date and are rounded once, after the last sample.
#[must_use]
pub fn normalize_daily(samples: &[RawSample]) -> Vec<DayAggregate> {
    let mut days: Vec<DayAccumulator> = Vec::new();

    for sample in samples {
        let date = sample.dt_txt.get(..10).unwrap_or(sample.dt_txt.as_str());
        let first_weather = sample.weather.first();
        let icon = first_weather.and_then(|w| w.icon.clone());

        let idx = match days.iter().position(|day| day.date == date) {
            Some(idx) => idx,
            None => {
                days.push(DayAccumulator {
                    date: date.to_string(),
                    icon: icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
                    min: f64::INFINITY,
                    max: f64::NEG_INFINITY,
                    periods: Vec::new(),
                });
                days.len() - 1
            }
        };

        let day = &mut days[idx];
        let main = &sample.main;
        day.min = day.min.min(main.temp_min).min(main.temp);
        day.max = day.max.max(main.temp_max).max(main.temp);
        day.periods.push(PeriodSample {
            time: sample.dt_txt.get(11..16).unwrap_or_default().to_string(),
            temp: round_half_up(main.temp),
            humidity: main.humidity,
            pressure: main.pressure,
            wind: sample.wind.as_ref().and_then(|w| w.speed),
            weather: first_weather.and_then(|w| w.main.clone()),
            icon,
        });
    }

    days.into_iter()
        .map(|day| DayAggregate {
            day_label: weekday_label(&day.date),
            min: round_half_up(day.min),
            max: round_half_up(day.max),
            date: day.date,
            icon: day.icon,
            periods: day.periods,
        })
        .collect()
}
