use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, LocationError};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(LocationError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Unit system requested from the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Parameters of one weather request.
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub coordinate: Coordinate,
    pub unit_system: UnitSystem,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub humidity_percent: i32,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure_hpa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed_meters_per_sec: f64,
    #[serde(default)]
    pub direction_deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    pub sunrise_unix_seconds: i64,
    pub sunset_unix_seconds: i64,
}

/// One complete weather response at a point in time.
///
/// This is both the domain value rendered by presenters and the blob stored
/// in the cache. Optional fields were added after the first cache format and
/// default to `None` so older blobs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub conditions: Vec<Condition>,
    pub temperature: Temperature,
    pub wind: Wind,
    pub sun: Sun,
    pub location_name: String,
    pub country_code: String,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub cloudiness_percent: Option<i32>,
    #[serde(default)]
    pub observed_at_unix_seconds: Option<i64>,
    #[serde(default)]
    pub utc_offset_seconds: Option<i32>,
}

impl WeatherSnapshot {
    /// The condition shown in the headline.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    /// Check that `conditions` is non-empty and every float is finite.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.conditions.is_empty() {
            return Err(FetchError::Deserialization(
                "response contained no weather conditions".to_string(),
            ));
        }

        let t = &self.temperature;
        let required = [t.current, t.min, t.max, self.wind.speed_meters_per_sec];
        let optional = [t.feels_like, t.pressure_hpa, self.wind.direction_deg];

        let all_finite = required.iter().all(|v| v.is_finite())
            && optional.iter().flatten().all(|v| v.is_finite());

        if !all_finite {
            return Err(FetchError::Deserialization(
                "response contained a non-finite number".to_string(),
            ));
        }

        Ok(())
    }
}
