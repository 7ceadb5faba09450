use clap::{Args, Parser, Subcommand};
use geoweather_core::{Config, UnitSystem, WeatherCache};

use crate::{app, configure, terminal::TerminalPresenter};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Weather for where you are")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the API key, units and location source.
    Configure,

    /// Show cached weather, then check location and fetch fresh weather.
    Show(FetchArgs),

    /// Fetch fresh weather, skipping the location and permission checks.
    Refresh(FetchArgs),

    /// Show the cached weather without touching the network.
    Cached,
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Latitude to use instead of the configured location source.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of the configured location source.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Unit system requested from the API.
    #[arg(long)]
    pub units: Option<UnitSystem>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                // Skip the environment override so it is never written to disk.
                let config = Config::load_from(&Config::config_file_path()?)?;
                configure::run(config).await?;
            }
            Command::Show(args) => {
                let config = Config::load()?;
                let mut workflow = app::build_workflow(config, &args)?;
                let state = workflow.start().await;
                tracing::debug!(state = state.name(), "Show finished");
            }
            Command::Refresh(args) => {
                let config = Config::load()?;
                let mut workflow = app::build_workflow(config, &args)?;
                let state = workflow.refresh().await;
                tracing::debug!(state = state.name(), "Refresh finished");
            }
            Command::Cached => {
                let config = Config::load()?;
                let cache = WeatherCache::new(&Config::cache_dir()?);
                let presenter = TerminalPresenter::default();
                app::show_cached(&config, &cache, &presenter);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_coordinates_and_units() {
        let cli = Cli::parse_from([
            "geoweather", "show", "--lat", "51.5", "--lon", "-0.12", "--units", "imperial",
        ]);

        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.lat, Some(51.5));
                assert_eq!(args.lon, Some(-0.12));
                assert_eq!(args.units, Some(UnitSystem::Imperial));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn latitude_without_longitude_is_rejected() {
        let result = Cli::try_parse_from(["geoweather", "refresh", "--lat", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["geoweather", "cached", "-v"]);
        assert!(cli.verbose);
    }
}
