use crate::{Config, WeatherQuery, WeatherSnapshot, error::FetchError};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// One-shot access to current weather.
///
/// Implementations make exactly one attempt per call; retrying is the
/// caller's decision.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the OpenWeather client pointed at the configured base URL.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let client = OpenWeatherClient::with_base_url(config.base_url())
        .map_err(|e| anyhow::anyhow!("Failed to build weather HTTP client: {e}"))?;
    Ok(client)
}
