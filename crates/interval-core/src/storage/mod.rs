mod config;

pub use config::{Config, DisplayConfig, NotificationsConfig, SoundKind};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the config directory for the timer.
///
/// `INTERVAL_CONFIG_DIR` wins outright. Otherwise the platform config dir
/// (`~/.config` on Linux) joined with `interval`, or `interval-dev` when
/// `INTERVAL_ENV=dev`.
///
/// # Errors
/// Returns an error if no config directory can be determined or if
/// creating it fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("INTERVAL_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base = dirs::config_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
                .ok_or(ConfigError::NoConfigDir)?;
            let env = std::env::var("INTERVAL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base.join("interval-dev")
            } else {
                base.join("interval")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
