//! TOML-based application configuration.
//!
//! Stores:
//! - Session defaults (work/break seconds, rounds)
//! - Notification preferences
//! - Display refresh rate
//!
//! Configuration is stored at `<config dir>/interval/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::SessionConfig;

/// How phase boundaries are announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    /// Terminal bell.
    #[default]
    Bell,
    /// Sine tones through the audio device, when built with audio support.
    Audio,
    Silent,
}

impl std::str::FromStr for SoundKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bell" => Ok(SoundKind::Bell),
            "audio" => Ok(SoundKind::Audio),
            "silent" => Ok(SoundKind::Silent),
            other => Err(format!("unknown sound '{other}' (expected bell, audio or silent)")),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sound: SoundKind,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How often the progress line is redrawn.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<config dir>/interval/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

const MIN_TICK_MS: u64 = 10;
const MAX_TICK_MS: u64 = 1000;

fn default_true() -> bool {
    true
}
fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: SoundKind::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl DisplayConfig {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let parse_failed = |message: String| ConfigError::ParseFailed {
            key: key.to_string(),
            value: value.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| parse_failed(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| parse_failed("not a finite number".into()))?
                    } else {
                        return Err(parse_failed("not a number".into()).into());
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(unknown().into());
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown().into())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.session = cfg.session.clamped();
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, writing defaults");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, in memory only. Session fields are
    /// clamped like the engine clamps them.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed {
            key: key.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })?;
        updated.session = updated.session.clamped();
        *self = updated;
        Ok(())
    }

    /// Every leaf key, in dot notation.
    pub fn keys(&self) -> Vec<String> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<String>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                _ => out.push(prefix.to_string()),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails; the error is logged.
    pub fn load_or_default() -> Self {
        Self::or_default(Self::load())
    }

    fn or_default(loaded: Result<Self>) -> Self {
        loaded.unwrap_or_else(|e| {
            warn!(error = %e, "config unreadable, using defaults");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session, SessionConfig::default());
        assert_eq!(parsed.notifications.sound, SoundKind::Bell);
        assert_eq!(parsed.display.tick_interval_ms, 100);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Config = toml::from_str("[session]\nwork_secs = 45.0\n").unwrap();
        assert_eq!(parsed.session.work_secs, 45.0);
        assert_eq!(parsed.session.break_secs, 20.0);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.total_rounds").as_deref(), Some("3"));
        assert_eq!(cfg.get("notifications.sound").as_deref(), Some("bell"));
        assert!(cfg.get("session").is_none());
        assert!(cfg.get("session.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("session.work_secs", "45").unwrap();
        cfg.set("session.break_secs", "12.5").unwrap();
        cfg.set("notifications.enabled", "false").unwrap();
        cfg.set("notifications.sound", "silent").unwrap();
        assert_eq!(cfg.session.work_secs, 45.0);
        assert_eq!(cfg.session.break_secs, 12.5);
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.notifications.sound, SoundKind::Silent);
    }

    #[test]
    fn set_clamps_session_fields() {
        let mut cfg = Config::default();
        cfg.set("session.total_rounds", "0").unwrap();
        cfg.set("session.work_secs", "0.2").unwrap();
        assert_eq!(cfg.session.total_rounds, 1);
        assert_eq!(cfg.session.work_secs, 1.0);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_types() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("session.nonexistent", "1"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.set("session", "1").is_err());
        assert!(cfg.set("notifications.enabled", "maybe").is_err());
        assert!(cfg.set("session.total_rounds", "2.5").is_err());
        assert!(cfg.set("notifications.sound", "kazoo").is_err());
        assert_eq!(cfg.session, SessionConfig::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.session, SessionConfig::default());

        let mut cfg = cfg;
        cfg.set("session.total_rounds", "5").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.session.total_rounds, 5);
    }

    #[test]
    fn load_from_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "session = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nwork_secs = \"long\"\n").unwrap();
        let cfg = Config::or_default(Config::load_from(&path));
        assert_eq!(cfg.session, SessionConfig::default());
        // The broken file is left for the user to fix.
        assert!(std::fs::read_to_string(&path).unwrap().contains("long"));
    }

    #[test]
    fn tick_interval_is_bounded() {
        let mut display = DisplayConfig::default();
        display.tick_interval_ms = 0;
        assert_eq!(display.tick_interval().as_millis(), 10);
        display.tick_interval_ms = 60_000;
        assert_eq!(display.tick_interval().as_millis(), 1000);
    }

    #[test]
    fn keys_lists_leaves() {
        let keys = Config::default().keys();
        assert!(keys.contains(&"session.work_secs".to_string()));
        assert!(keys.contains(&"display.tick_interval_ms".to_string()));
        assert!(!keys.contains(&"session".to_string()));
    }
}
