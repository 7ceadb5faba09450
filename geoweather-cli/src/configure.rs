//! Interactive `geoweather configure`.

use anyhow::{Context, Result};
use geoweather_core::{Config, Coordinate, UnitSystem};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};

pub async fn run(config: Config) -> Result<()> {
    let config = tokio::task::spawn_blocking(move || prompt(config))
        .await
        .context("Configuration prompt task failed")??;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn prompt(mut config: Config) -> Result<Config> {
    let mut key_prompt = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.api_key().is_ok() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key.");
    }
    let key = key_prompt.prompt()?;
    apply_api_key(&mut config, &key);

    let units = UnitSystem::all().to_vec();
    let start = starting_cursor(&units, config.units);
    config.units = Select::new("Units:", units).with_starting_cursor(start).prompt()?;

    let current = config.fixed_coordinate().ok().flatten();
    let use_fixed = Confirm::new("Use a fixed location?").with_default(current.is_some()).prompt()?;

    let fixed = if use_fixed { Some(prompt_coordinate(current)?) } else { None };
    config.set_fixed_coordinate(fixed);

    if fixed.is_none() {
        config.location.ip_lookup = Confirm::new("Look up your location from your IP address?")
            .with_default(config.location.ip_lookup)
            .prompt()?;
    }

    let consent = Confirm::new("Allow geoweather to use your location?")
        .with_default(config.location.consent.unwrap_or(true))
        .prompt()?;
    config.location.consent = Some(consent);

    Ok(config)
}

fn prompt_coordinate(current: Option<Coordinate>) -> Result<Coordinate> {
    loop {
        let mut lat = CustomType::<f64>::new("Latitude:").with_error_message("Enter a number");
        let mut lon = CustomType::<f64>::new("Longitude:").with_error_message("Enter a number");
        if let Some(c) = current {
            lat = lat.with_default(c.latitude);
            lon = lon.with_default(c.longitude);
        }

        let (lat, lon) = (lat.prompt()?, lon.prompt()?);
        match Coordinate::new(lat, lon) {
            Ok(coordinate) => return Ok(coordinate),
            Err(e) => eprintln!("{e}"),
        }
    }
}

/// An empty answer keeps the stored key.
fn apply_api_key(config: &mut Config, answer: &str) {
    let answer = answer.trim();
    if !answer.is_empty() {
        config.api_key = Some(answer.to_string());
    }
}

fn starting_cursor(options: &[UnitSystem], current: UnitSystem) -> usize {
    options.iter().position(|u| *u == current).unwrap_or(0)
}
