//! Terminal implementations of the host and presenter.

use std::{
    io::{self, IsTerminal, Write},
    sync::Mutex,
};

use async_trait::async_trait;
use geoweather_core::{Config, Host, PermissionOutcome, Presenter, WeatherDisplay, locale};
use tracing::warn;

pub struct TerminalHost {
    config: Mutex<Config>,
    consent_implied: bool,
}

impl TerminalHost {
    pub fn new(config: Config, consent_implied: bool) -> Self {
        Self {
            config: Mutex::new(config),
            consent_implied,
        }
    }

    /// Configured country override, else the process locale.
    pub fn country_for(config: &Config) -> Option<String> {
        config
            .country
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .or_else(locale::system_country)
    }

    fn stored_consent(&self) -> Option<bool> {
        self.config.lock().ok().and_then(|cfg| cfg.location.consent)
    }

    fn remember_consent(&self, granted: bool) {
        if let Ok(mut cfg) = self.config.lock() {
            cfg.location.consent = Some(granted);
        }

        // Re-read the file so environment overrides are not persisted.
        let stored = Config::config_file_path().and_then(|path| {
            let mut on_disk = Config::load_from(&path)?;
            on_disk.location.consent = Some(granted);
            on_disk.save_to(&path)
        });
        if let Err(e) = stored {
            warn!("Failed to store location consent: {e:#}");
        }
    }
}

#[async_trait]
impl Host for TerminalHost {
    fn open_location_settings(&self) {
        let path = Config::config_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the config file".to_string());

        eprintln!(
            "Hint: run `geoweather configure` to set a fixed location, \
             or enable `ip_lookup` under [location] in {path}."
        );
    }

    async fn request_location_permission(&self) -> PermissionOutcome {
        if self.consent_implied {
            return PermissionOutcome::Granted;
        }

        match self.stored_consent() {
            Some(true) => return PermissionOutcome::Granted,
            Some(false) => return PermissionOutcome::PermanentlyDenied,
            None => {}
        }

        if !io::stdin().is_terminal() {
            return PermissionOutcome::RationaleNeeded;
        }

        let answer = tokio::task::spawn_blocking(|| {
            inquire::Confirm::new("Allow geoweather to use your location?")
                .with_default(true)
                .with_help_message(
                    "Your answer is remembered; change it with `geoweather configure`.",
                )
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(granted)) => {
                self.remember_consent(granted);
                if granted {
                    PermissionOutcome::Granted
                } else {
                    PermissionOutcome::PermanentlyDenied
                }
            }
            Ok(Err(e)) => {
                warn!("Location prompt aborted: {e}");
                PermissionOutcome::RationaleNeeded
            }
            Err(e) => {
                warn!("Location prompt task failed: {e}");
                PermissionOutcome::RationaleNeeded
            }
        }
    }

    fn show_permission_rationale(&self) {
        eprintln!(
            "geoweather needs your location to look up the weather.\n\
             Run `geoweather configure` to allow it, or pass --lat and --lon."
        );
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }

    fn country_code(&self) -> Option<String> {
        let cfg = self.config.lock().ok()?;
        Self::country_for(&cfg)
    }
}

#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl TerminalPresenter {
    pub fn render(display: Option<&WeatherDisplay>) -> String {
        let Some(d) = display else {
            return "No weather data yet.\n".to_string();
        };

        let icon = d.icon_asset.as_deref().map(|a| format!("  [{a}]")).unwrap_or_default();

        format!(
            "{name}, {country}\n\
             {main} ({description}){icon}\n\
             Temperature  {temp}   ({min} / {max})\n\
             Humidity     {humidity}\n\
             Wind         {wind} m/s\n\
             Sunrise      {sunrise}   Sunset {sunset}\n",
            name = d.location_name,
            country = d.country,
            main = d.main,
            description = d.description,
            temp = d.temperature,
            min = d.min,
            max = d.max,
            humidity = d.humidity,
            wind = d.wind_speed,
            sunrise = d.sunrise,
            sunset = d.sunset,
        )
    }
}

impl Presenter for TerminalPresenter {
    fn present(&self, display: Option<&WeatherDisplay>) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", Self::render(display));
    }

    fn set_busy(&self, busy: bool) {
        if busy && io::stderr().is_terminal() {
            eprintln!("Fetching weather...");
        }
    }
}
