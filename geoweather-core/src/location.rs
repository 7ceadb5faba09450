//! Location sources.
//!
//! A [`LocationProvider`] reports which kinds of provider are enabled and
//! resolves one fix. Two concrete sources exist: a fixed coordinate from the
//! configuration (the "gps" slot) and an IP geolocation lookup (the
//! "network" slot). [`ConfiguredLocation`] combines them.

use std::{fmt::Debug, future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::LocationError, model::Coordinate};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com";

const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Which location-capable providers are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderStatus {
    pub gps: bool,
    pub network: bool,
}

impl ProviderStatus {
    pub fn any(&self) -> bool {
        self.gps || self.network
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn provider_status(&self) -> ProviderStatus;

    async fn is_enabled(&self) -> bool {
        self.provider_status().await.any()
    }

    /// Resolve the first available fix, waiting at most `timeout`.
    ///
    /// Fails with [`LocationError::Disabled`] when no provider is enabled.
    async fn current_location(&self, timeout: Duration) -> Result<Coordinate, LocationError>;
}

/// Await `fix`, mapping an elapsed deadline to [`LocationError::Timeout`].
pub async fn bounded_fix<F>(timeout: Duration, fix: F) -> Result<Coordinate, LocationError>
where
    F: Future<Output = Result<Coordinate, LocationError>>,
{
    tokio::time::timeout(timeout, fix).await.map_err(|_| LocationError::Timeout(timeout))?
}

/// A coordinate known up front, e.g. from the config file or CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocation {
    coordinate: Option<Coordinate>,
}

impl StaticLocation {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            gps: self.coordinate.is_some(),
            network: false,
        }
    }

    async fn current_location(&self, _timeout: Duration) -> Result<Coordinate, LocationError> {
        self.coordinate.ok_or(LocationError::Disabled)
    }
}

/// Approximate position derived from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

impl IpGeolocation {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_base_url(DEFAULT_IP_LOOKUP_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { base_url, http })
    }

    async fn lookup(&self) -> Result<Coordinate, LocationError> {
        let url = format!("{}/json", self.base_url);
        debug!(%url, "Looking up location from IP address");

        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon,city")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(format!("IP lookup failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!("IP lookup returned status {status}")));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("IP lookup parse error: {e}")))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| "unknown reason".to_string());
            return Err(LocationError::Unavailable(format!("IP lookup failed: {reason}")));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(LocationError::Unavailable("IP lookup returned no coordinates".to_string()));
        };

        let coordinate = Coordinate::new(lat, lon)?;
        info!(city = body.city.as_deref().unwrap_or("?"), %coordinate, "Resolved location from IP");
        Ok(coordinate)
    }
}

#[async_trait]
impl LocationProvider for IpGeolocation {
    async fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            gps: false,
            network: true,
        }
    }

    async fn current_location(&self, timeout: Duration) -> Result<Coordinate, LocationError> {
        bounded_fix(timeout, self.lookup()).await
    }
}

/// Fixed coordinate first, IP lookup as the fallback provider.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    fixed: StaticLocation,
    ip: Option<IpGeolocation>,
}

impl ConfiguredLocation {
    pub fn new(fixed: Option<Coordinate>, ip: Option<IpGeolocation>) -> Self {
        Self {
            fixed: StaticLocation::new(fixed),
            ip,
        }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocation {
    async fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            gps: self.fixed.coordinate().is_some(),
            network: self.ip.is_some(),
        }
    }

    async fn current_location(&self, timeout: Duration) -> Result<Coordinate, LocationError> {
        if let Some(coordinate) = self.fixed.coordinate() {
            return Ok(coordinate);
        }

        match &self.ip {
            Some(ip) => ip.current_location(timeout).await,
            None => Err(LocationError::Disabled),
        }
    }
}
