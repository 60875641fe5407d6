use chrono::{DateTime, Datelike, Timelike};

use crate::domain::forecast::RawSample;

pub const CHART_POINTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub wind: Vec<f64>,
    pub pressure: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// `dd/mm/yyyy H:MM` in UTC; the hour is not zero-padded.
fn point_label(dt: i64) -> String {
    match DateTime::from_timestamp(dt, 0) {
        Some(at) => format!(
            "{:02}/{:02}/{} {}:{:02}",
            at.day(),
            at.month(),
            at.year(),
            at.hour(),
            at.minute()
        ),
        None => String::new(),
    }
}

/// Builds the multi-axis chart datasets from the first `limit` raw samples.
#[must_use]
pub fn chart_series(samples: &[RawSample], limit: usize) -> ChartSeries {
    let mut series = ChartSeries::default();
    for sample in samples.iter().take(limit) {
        series.labels.push(point_label(sample.dt));
        series.temperature.push(sample.main.temp);
        series.humidity.push(sample.main.humidity.unwrap_or_default());
        series.pressure.push(sample.main.pressure.unwrap_or_default());
        series
            .wind
            .push(sample.wind.as_ref().and_then(|w| w.speed).unwrap_or_default());
    }
    series
}
