use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Condition, Coordinate, Sun, Temperature, WeatherQuery, WeatherSnapshot, Wind},
};

use super::WeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the OpenWeatherMap "current weather" endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { base_url, http })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/weather", self.base_url)
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError> {
        let url = self.endpoint();
        let lat = query.coordinate.latitude.to_string();
        let lon = query.coordinate.longitude.to_string();

        debug!(%url, %lat, %lon, units = %query.unit_system, "Requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", query.unit_system.as_str()),
                ("appid", query.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(FetchError::from_status(status.as_u16()));
        }

        let body = res.text().await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Deserialization(e.to_string()))?;

        let snapshot = parsed.into_snapshot();
        snapshot.validate()?;

        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: f64,
    temp_max: f64,
    pressure: Option<f64>,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: i32,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: Option<OwCoord>,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    clouds: Option<OwClouds>,
    sys: OwSys,
    #[serde(default)]
    name: String,
    dt: Option<i64>,
    timezone: Option<i32>,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        let conditions = self
            .weather
            .into_iter()
            .map(|w| Condition {
                main: w.main,
                description: w.description,
                icon_code: w.icon,
            })
            .collect();

        WeatherSnapshot {
            conditions,
            temperature: Temperature {
                current: self.main.temp,
                min: self.main.temp_min,
                max: self.main.temp_max,
                humidity_percent: self.main.humidity,
                feels_like: self.main.feels_like,
                pressure_hpa: self.main.pressure,
            },
            wind: Wind {
                speed_meters_per_sec: self.wind.speed,
                direction_deg: self.wind.deg,
            },
            sun: Sun {
                sunrise_unix_seconds: self.sys.sunrise,
                sunset_unix_seconds: self.sys.sunset,
            },
            location_name: self.name,
            country_code: self.sys.country,
            coordinate: self.coord.and_then(|c| Coordinate::new(c.lat, c.lon).ok()),
            cloudiness_percent: self.clouds.map(|c| c.all),
            observed_at_unix_seconds: self.dt,
            utc_offset_seconds: self.timezone,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
