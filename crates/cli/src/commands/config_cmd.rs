//! `planloop config`: print the effective configuration.

use planloop_config::AppConfig;

const REDACTED: &str = "[REDACTED]";

pub fn show(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Never echo secrets to the terminal
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }

    println!(
        "# {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    print!("{}", config.to_toml()?);

    Ok(())
}
