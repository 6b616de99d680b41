/// Configuration loading from TOML file
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::error::{ClockError, Result};
use crate::time::{MarketClosureWindow, SessionClock, SessionDefinition};
use crate::types::Config;
use crate::utils::parse_timezone;

/// Where the running configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;

    // Validate config
    validate_config(&config)?;

    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in sessions
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<(Config, ConfigSource)> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok((Config::default(), ConfigSource::Defaults));
    }

    let config = load_config(path)?;
    Ok((config, ConfigSource::File(path.to_path_buf())))
}

fn validate_config(config: &Config) -> Result<()> {
    if config.tick_interval_sec == 0 {
        return Err(ClockError::ConfigError("tick_interval_sec must be > 0".to_string()));
    }

    if config.log_level.trim().is_empty() {
        return Err(ClockError::ConfigError("log_level is empty".to_string()));
    }

    config.timezone()?;

    // Sessions are checked against the configured closure
    config.build_clock()?;

    Ok(())
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.exchange_timezone)
    }

    pub fn closure_window(&self) -> Result<MarketClosureWindow> {
        match &self.closure {
            Some(c) => MarketClosureWindow::new(c.start_day, c.start_hour, c.end_day, c.end_hour),
            None => Ok(MarketClosureWindow::weekend()),
        }
    }

    pub fn build_clock(&self) -> Result<SessionClock> {
        let sessions = self
            .sessions
            .iter()
            .map(SessionDefinition::try_from)
            .collect::<Result<Vec<_>>>()?;

        SessionClock::new(sessions, self.closure_window()?)
    }
}
