//! Plain-text rendering of the dashboard panels.

use chrono::{DateTime, Utc};

use crate::{
    app::{
        dashboard::Dashboard,
        state::{CityClock, FiveDayState, Notice, NoticeLevel, View},
    },
    data::openweather::CurrentSnapshot,
    domain::{
        chart::ChartSeries,
        forecast::DayAggregate,
        icons::{IconKey, glyph_for_code},
    },
};

pub fn render(dashboard: &Dashboard) -> String {
    render_at(dashboard, Utc::now())
}

/// Renders the selected tab, then favorites and notices. `now` drives the
/// city clock.
pub fn render_at(dashboard: &Dashboard, now: DateTime<Utc>) -> String {
    let mut sections = vec![render_tabs(dashboard.view)];
    match dashboard.view {
        View::Today => {
            if let Some(today) = &dashboard.today {
                sections.push(render_today(today));
            }
            if let Some(clock) = &dashboard.clock {
                sections.push(render_clock(clock, now));
            }
            if let Some(url) = &dashboard.background {
                sections.push(format!("Background: {url}"));
            }
        }
        View::FiveDays => {
            if !dashboard.five_day.days().is_empty() {
                sections.push(render_days(&dashboard.five_day));
            }
            if let Some(day) = dashboard.five_day.selected() {
                sections.push(render_detail(day));
            }
            if dashboard.chart_expanded
                && let Some(series) = dashboard.five_day.chart()
            {
                sections.push(render_chart(&series));
            }
        }
    }
    if !dashboard.favorites.is_empty() {
        sections.push(format!("Favorites: {}", dashboard.favorites.join(", ")));
    }
    if !dashboard.notices().is_empty() {
        sections.push(render_notices(dashboard.notices()));
    }

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

pub fn render_tabs(view: View) -> String {
    match view {
        View::Today => "[Today]  5 Days".to_string(),
        View::FiveDays => " Today  [5 Days]".to_string(),
    }
}

pub fn render_clock(clock: &CityClock, now: DateTime<Utc>) -> String {
    format!("{} {}", IconKey::Clock.glyph(), clock.reading(now))
}

pub fn render_today(today: &CurrentSnapshot) -> String {
    let place = match today.country.as_deref() {
        Some(country) if !country.is_empty() => format!("{}, {country}", today.city),
        _ => today.city.clone(),
    };
    format!(
        "{place}  {} {}°\nmin {}°  max {}°  {} {}  {} {}",
        glyph_for_code(&today.icon),
        today.current_temp,
        today.today_min,
        today.today_max,
        IconKey::Sunrise.glyph(),
        today.sunrise,
        IconKey::Sunset.glyph(),
        today.sunset,
    )
}

/// One line per day card; `>` marks the expanded one.
pub fn render_days(state: &FiveDayState) -> String {
    let mut lines = vec![match &state.active_city {
        Some(city) => format!("Five days: {city}"),
        None => "Five days".to_string(),
    }];
    for day in state.days() {
        let label = day.card_label();
        let marker = if state.selected_day.as_deref() == Some(label.as_str()) {
            '>'
        } else {
            ' '
        };
        lines.push(format!(
            "{marker} {:<3} {label:<6}  {}  {}° / {}°",
            day.day_label,
            glyph_for_code(&day.icon),
            day.min,
            day.max,
        ));
    }
    lines.join("\n")
}

pub fn render_detail(day: &DayAggregate) -> String {
    let mut lines = vec![format!("{} {}", day.day_label, day.card_label())];
    for period in &day.periods {
        lines.push(format!(
            "  {}  {:>3}°  {:<12} {} {}%  {} {} hPa  {} {} m/s",
            period.time,
            period.temp,
            period.weather.as_deref().unwrap_or("-"),
            IconKey::Humidity.glyph(),
            figure(period.humidity, 0),
            IconKey::Barometer.glyph(),
            figure(period.pressure, 0),
            IconKey::Wind.glyph(),
            figure(period.wind, 1),
        ));
    }
    lines.join("\n")
}

pub fn render_chart(series: &ChartSeries) -> String {
    let mut lines = vec!["Chart".to_string()];
    for (idx, label) in series.labels.iter().enumerate() {
        lines.push(format!(
            "  {label:<16}  {:>5.1}°C  {:>3.0}%  {:>4.1} m/s  {:>4.0} hPa",
            series.temperature[idx],
            series.humidity[idx],
            series.wind[idx],
            series.pressure[idx],
        ));
    }
    lines.join("\n")
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| match notice.level {
            NoticeLevel::Info => format!("[info] {}", notice.text),
            NoticeLevel::Error => format!("[error] {}", notice.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn figure(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}
