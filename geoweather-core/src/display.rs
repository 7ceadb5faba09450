//! Presentation of a snapshot: unit suffix, clock formatting and icons.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

use crate::model::WeatherSnapshot;

/// Countries that display Fahrenheit.
const FAHRENHEIT_COUNTRIES: &[&str] = &["US", "LR", "MM"];

/// Default icon code to asset table.
pub const DEFAULT_ICONS: &[(&str, &str)] = &[
    ("01d", "sunny"),
    ("02d", "cloud"),
    ("03d", "cloud"),
    ("04d", "cloud"),
    ("04n", "cloud"),
    ("10d", "rain"),
    ("11d", "storm"),
    ("13d", "snowflake"),
    ("01n", "cloud"),
    ("02n", "cloud"),
    ("03n", "cloud"),
    ("10n", "cloud"),
    ("11n", "rain"),
    ("13n", "snowflake"),
];

pub fn unit_suffix(country: Option<&str>) -> &'static str {
    let fahrenheit = country
        .is_some_and(|c| FAHRENHEIT_COUNTRIES.iter().any(|f| f.eq_ignore_ascii_case(c.trim())));

    if fahrenheit { "°F" } else { "°C" }
}

/// Format Unix seconds as `HH:mm` in `tz`.
pub fn format_clock<Tz: TimeZone>(unix_seconds: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(unix_seconds, 0) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Lookup from condition icon code to image asset.
#[derive(Debug, Clone)]
pub struct IconTable {
    assets: HashMap<String, String>,
}

impl IconTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let assets = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { assets }
    }

    pub fn asset_for(&self, icon_code: &str) -> Option<&str> {
        self.assets.get(icon_code).map(String::as_str)
    }
}

impl Default for IconTable {
    fn default() -> Self {
        Self::new(DEFAULT_ICONS.iter().copied())
    }
}

/// Time zone used for sunrise and sunset.
#[derive(Debug, Clone, Copy, Default)]
pub enum ClockZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ClockZone {
    pub fn format(&self, unix_seconds: i64) -> String {
        match self {
            ClockZone::Local => format_clock(unix_seconds, &Local),
            ClockZone::Utc => format_clock(unix_seconds, &Utc),
            ClockZone::Fixed(offset) => format_clock(unix_seconds, offset),
        }
    }
}

/// Everything a presenter needs to turn a snapshot into view fields.
#[derive(Debug, Clone, Default)]
pub struct DisplayContext {
    pub icons: IconTable,
    pub zone: ClockZone,
}

impl DisplayContext {
    pub fn new(icons: IconTable, zone: ClockZone) -> Self {
        Self { icons, zone }
    }

    /// Build the view model. `country` is the host locale region, queried
    /// on each render.
    pub fn build(&self, snapshot: &WeatherSnapshot, country: Option<&str>) -> WeatherDisplay {
        let suffix = unit_suffix(country);
        let condition = snapshot.primary_condition();
        let t = &snapshot.temperature;

        WeatherDisplay {
            main: condition.map(|c| c.main.clone()).unwrap_or_default(),
            description: condition.map(|c| c.description.clone()).unwrap_or_default(),
            icon_asset: condition
                .and_then(|c| self.icons.asset_for(&c.icon_code))
                .map(str::to_string),
            temperature: format!("{:.1}{suffix}", t.current),
            humidity: format!("{} per cent", t.humidity_percent),
            min: format!("{:.1}{suffix} min", t.min),
            max: format!("{:.1}{suffix} max", t.max),
            wind_speed: format!("{:.1}", snapshot.wind.speed_meters_per_sec),
            location_name: snapshot.location_name.clone(),
            country: snapshot.country_code.clone(),
            sunrise: self.zone.format(snapshot.sun.sunrise_unix_seconds),
            sunset: self.zone.format(snapshot.sun.sunset_unix_seconds),
        }
    }
}

/// Rendered view fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherDisplay {
    pub main: String,
    pub description: String,
    pub icon_asset: Option<String>,
    pub temperature: String,
    pub humidity: String,
    pub min: String,
    pub max: String,
    pub wind_speed: String,
    pub location_name: String,
    pub country: String,
    pub sunrise: String,
    pub sunset: String,
}

/// UI rendering sink.
pub trait Presenter: Send + Sync {
    /// Paint `display`, or the empty state when `None`.
    fn present(&self, display: Option<&WeatherDisplay>);

    /// Show or hide a progress indicator.
    fn set_busy(&self, _busy: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_snapshot;

    #[test]
    fn fahrenheit_countries() {
        assert_eq!(unit_suffix(Some("US")), "°F");
        assert_eq!(unit_suffix(Some("LR")), "°F");
        assert_eq!(unit_suffix(Some("MM")), "°F");
        assert_eq!(unit_suffix(Some("us")), "°F");
    }

    #[test]
    fn everything_else_is_celsius() {
        assert_eq!(unit_suffix(Some("GB")), "°C");
        assert_eq!(unit_suffix(Some("DE")), "°C");
        assert_eq!(unit_suffix(Some("")), "°C");
        assert_eq!(unit_suffix(None), "°C");
    }

    #[test]
    fn epoch_formats_to_midnight_utc() {
        assert_eq!(format_clock(0, &Utc), "00:00");
        assert_eq!(ClockZone::Utc.format(0), "00:00");
    }

    #[test]
    fn clock_respects_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_clock(0, &plus_two), "02:00");
        assert_eq!(format_clock(45_296, &Utc), "12:34");
    }

    #[test]
    fn out_of_range_timestamp_renders_placeholder() {
        assert_eq!(format_clock(i64::MAX, &Utc), "--:--");
    }

    #[test]
    fn icon_table_lookup() {
        let icons = IconTable::default();
        assert_eq!(icons.asset_for("01d"), Some("sunny"));
        assert_eq!(icons.asset_for("11d"), Some("storm"));
        assert_eq!(icons.asset_for("13n"), Some("snowflake"));
        assert_eq!(icons.asset_for("50d"), None);
    }

    #[test]
    fn build_display_from_snapshot() {
        let ctx = DisplayContext::new(IconTable::default(), ClockZone::Utc);
        let display = ctx.build(&sample_snapshot(), Some("GB"));

        assert_eq!(display.main, "Clouds");
        assert_eq!(display.description, "broken clouds");
        assert_eq!(display.icon_asset.as_deref(), Some("cloud"));
        assert_eq!(display.temperature, "14.2°C");
        assert_eq!(display.min, "12.0°C min");
        assert_eq!(display.location_name, "London");
        assert_eq!(display.sunrise, "22:13");
    }

    #[test]
    fn unmatched_icon_leaves_asset_unset() {
        let mut snapshot = sample_snapshot();
        snapshot.conditions[0].icon_code = "50n".to_string();

        let display = DisplayContext::default().build(&snapshot, Some("US"));

        assert_eq!(display.icon_asset, None);
        assert!(display.temperature.ends_with("°F"));
    }

    #[test]
    fn injected_table_overrides_default() {
        let ctx = DisplayContext::new(IconTable::new([("04d", "overcast")]), ClockZone::Utc);
        let display = ctx.build(&sample_snapshot(), None);
        assert_eq!(display.icon_asset.as_deref(), Some("overcast"));
    }
}
