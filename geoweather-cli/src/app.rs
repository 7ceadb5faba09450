//! Wiring of the core workflow from the on-disk configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use geoweather_core::{
    ClockZone, Collaborators, Config, ConfiguredLocation, Coordinate, DisplayContext, IconTable,
    IpGeolocation, Presenter, SystemNetwork, WeatherCache, WeatherWorkflow, WorkflowSettings,
    provider::client_from_config,
};

use crate::{
    cli::FetchArgs,
    terminal::{TerminalHost, TerminalPresenter},
};

pub fn build_workflow(config: Config, args: &FetchArgs) -> Result<WeatherWorkflow> {
    let api_key = config.api_key()?.to_owned();

    let fixed = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon).context("Invalid --lat/--lon")?),
        _ => config.fixed_coordinate()?,
    };

    let ip = if config.location.ip_lookup {
        Some(IpGeolocation::new().context("Failed to build IP geolocation client")?)
    } else {
        None
    };

    let mut settings = WorkflowSettings::new(api_key);
    settings.unit_system = args.units.unwrap_or(config.units);
    settings.fix_timeout = config.fix_timeout();

    let client = client_from_config(&config)?;
    let cache = WeatherCache::new(&Config::cache_dir()?);

    // Coordinates given on the command line imply consent for this run.
    let host = TerminalHost::new(config, args.lat.is_some());

    let collaborators = Collaborators {
        location: Arc::new(ConfiguredLocation::new(fixed, ip)),
        network: Arc::new(SystemNetwork::default()),
        client: Arc::new(client),
        host: Arc::new(host),
        presenter: Arc::new(TerminalPresenter::default()),
    };

    let display = DisplayContext::new(IconTable::default(), ClockZone::Local);

    Ok(WeatherWorkflow::new(collaborators, cache, display, settings))
}

/// Paint the cached snapshot, or the empty state.
pub fn show_cached(config: &Config, cache: &WeatherCache, presenter: &dyn Presenter) {
    let display = DisplayContext::new(IconTable::default(), ClockZone::Local);
    let country = TerminalHost::country_for(config);

    let rendered = cache.load().map(|snapshot| display.build(&snapshot, country.as_deref()));
    presenter.present(rendered.as_ref());
}
