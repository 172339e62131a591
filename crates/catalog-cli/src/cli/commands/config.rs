//! Config command handlers.

use anyhow::{Context, Result};
use catalog_core::config::{Config, paths};

/// Prints where the client keeps its files.
pub fn path() {
    println!("Config:  {}", paths::config_path().display());
    println!("Session: {}", paths::session_path().display());
}

/// Writes a commented config, seeding `api_url` from `--api-url` or the
/// environment when one is given.
pub fn init(api_url_override: Option<&str>) -> Result<()> {
    let config_path = paths::config_path();
    let config = Config {
        api_url: Config::default()
            .api_url(api_url_override)
            .context("resolve API url")?,
        ..Config::default()
    };

    config
        .init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    println!("  API URL: {}", config.api_url);
    Ok(())
}

/// Prints the effective config: the file merged with defaults and the
/// resolved API URL.
pub fn show(api_url_override: Option<&str>) -> Result<()> {
    let mut config = Config::load().context("load config")?;
    config.api_url = config
        .api_url(api_url_override)
        .context("resolve API url")?;
    print!("{}", config.render()?);
    Ok(())
}

pub fn generate() -> Result<()> {
    print!("{}", Config::generate()?);
    Ok(())
}
