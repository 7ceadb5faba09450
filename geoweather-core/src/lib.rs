//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - The location-gated fetch-and-cache workflow and its state machine
//! - Collaborator traits for location, network, host and rendering
//! - The OpenWeather client and the single-snapshot cache
//! - Presentation helpers (unit suffix, clock, icon table)
//! - Configuration & credentials handling
//!
//! It is used by `geoweather-cli`, but any host that implements the
//! collaborator traits can drive the workflow.

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod host;
pub mod locale;
pub mod location;
pub mod model;
pub mod network;
pub mod provider;
pub mod workflow;

pub use cache::WeatherCache;
pub use config::{Config, LocationConfig};
pub use display::{ClockZone, DisplayContext, IconTable, Presenter, WeatherDisplay};
pub use error::{CacheError, ErrorKind, FetchError, LocationError};
pub use host::{Host, PermissionOutcome};
pub use location::{ConfiguredLocation, IpGeolocation, LocationProvider, StaticLocation};
pub use model::{Coordinate, UnitSystem, WeatherQuery, WeatherSnapshot};
pub use network::{NetworkAvailability, StaticNetwork, SystemNetwork};
pub use provider::{OpenWeatherClient, WeatherClient};
pub use workflow::{Collaborators, WeatherWorkflow, WorkflowHandle, WorkflowSettings, WorkflowState};
