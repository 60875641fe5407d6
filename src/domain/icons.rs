use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKey {
    Sunrise,
    Sunset,
    Sun,
    Rain,
    RainNight,
    Thunder,
    Snow,
    CloudsSun,
    Cloudy,
    Barometer,
    Humidity,
    Wind,
    Clock,
}

const REGISTRY: [(IconKey, &str, &str); 13] = [
    (IconKey::Sunrise, "sunrise", "🌅"),
    (IconKey::Sunset, "sunset", "🌇"),
    (IconKey::Sun, "sun", "☀"),
    (IconKey::Rain, "rain", "🌧"),
    (IconKey::RainNight, "rainNight", "☔"),
    (IconKey::Thunder, "thunder", "⛈"),
    (IconKey::Snow, "snow", "❄"),
    (IconKey::CloudsSun, "cloudsSun", "⛅"),
    (IconKey::Cloudy, "cloudy", "☁"),
    (IconKey::Barometer, "barometer", "⏲"),
    (IconKey::Humidity, "humidity", "💧"),
    (IconKey::Wind, "wind", "🌬"),
    (IconKey::Clock, "clock", "🕒"),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown icon: {0}")]
pub struct UnknownIcon(pub String);

impl IconKey {
    pub fn name(self) -> &'static str {
        entry(self).1
    }

    pub fn glyph(self) -> &'static str {
        entry(self).2
    }
}

fn entry(key: IconKey) -> (IconKey, &'static str, &'static str) {
    REGISTRY
        .iter()
        .copied()
        .find(|(k, _, _)| *k == key)
        .unwrap_or(REGISTRY[2])
}

/// Maps an OpenWeather icon code (`"10d"`, `"13n"`) onto a registry key.
/// Unknown codes fall back to [`IconKey::Sun`].
#[must_use]
pub fn map_icon_code(code: &str) -> IconKey {
    match code {
        "01d" | "01n" => IconKey::Sun,
        "02d" | "02n" | "50d" | "50n" => IconKey::CloudsSun,
        "03d" | "03n" | "04d" | "04n" => IconKey::Cloudy,
        "09d" | "09n" | "10d" | "10n" => IconKey::Rain,
        "11d" | "11n" => IconKey::Thunder,
        "13d" | "13n" => IconKey::Snow,
        _ => IconKey::Sun,
    }
}

pub fn icon(name: &str) -> Result<&'static str, UnknownIcon> {
    REGISTRY
        .iter()
        .find(|(_, key_name, _)| *key_name == name)
        .map(|(_, _, glyph)| *glyph)
        .ok_or_else(|| UnknownIcon(name.to_string()))
}

#[must_use]
pub fn has_icon(name: &str) -> bool {
    icon(name).is_ok()
}

/// Glyph for an OpenWeather icon code.
#[must_use]
pub fn glyph_for_code(code: &str) -> &'static str {
    map_icon_code(code).glyph()
}
